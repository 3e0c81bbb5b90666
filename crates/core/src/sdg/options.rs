use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Flavor of a data dependence edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFlavor {
    /// SSA def-use through locals, parameters and return values.
    Scalar,
    /// Use of the base reference of a field or array access.
    BasePointer,
    /// Flow through an abstract heap location.
    Heap,
    /// Use of the operand of a checked cast.
    Cast,
}

/// Tag of a dependence edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependence {
    Control,
    Data(DataFlavor),
}

impl Dependence {
    /// Short label used when rendering edges.
    pub fn label(&self) -> &'static str {
        match self {
            Dependence::Control => "control",
            Dependence::Data(DataFlavor::Scalar) => "data",
            Dependence::Data(DataFlavor::Heap) => "heap",
            Dependence::Data(DataFlavor::BasePointer) => "base",
            Dependence::Data(DataFlavor::Cast) => "cast",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} dependence option '{value}'; expected one of: {expected}")]
pub struct OptionParseError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Precision levels for data dependence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataDependenceOptions {
    #[default]
    Full,
    NoBasePtrs,
    NoBaseNoHeap,
    NoHeap,
    NoBaseNoHeapNoCast,
    None,
}

impl DataDependenceOptions {
    pub const ALL: [DataDependenceOptions; 6] = [
        DataDependenceOptions::Full,
        DataDependenceOptions::NoBasePtrs,
        DataDependenceOptions::NoBaseNoHeap,
        DataDependenceOptions::NoHeap,
        DataDependenceOptions::NoBaseNoHeapNoCast,
        DataDependenceOptions::None,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DataDependenceOptions::Full => "full",
            DataDependenceOptions::NoBasePtrs => "no_base_ptrs",
            DataDependenceOptions::NoBaseNoHeap => "no_base_no_heap",
            DataDependenceOptions::NoHeap => "no_heap",
            DataDependenceOptions::NoBaseNoHeapNoCast => "no_base_no_heap_no_cast",
            DataDependenceOptions::None => "none",
        }
    }

    pub fn is_ignore_base_ptrs(self) -> bool {
        matches!(
            self,
            DataDependenceOptions::NoBasePtrs
                | DataDependenceOptions::NoBaseNoHeap
                | DataDependenceOptions::NoBaseNoHeapNoCast
                | DataDependenceOptions::None
        )
    }

    pub fn is_ignore_heap(self) -> bool {
        matches!(
            self,
            DataDependenceOptions::NoBaseNoHeap
                | DataDependenceOptions::NoHeap
                | DataDependenceOptions::NoBaseNoHeapNoCast
                | DataDependenceOptions::None
        )
    }

    pub fn is_ignore_casts(self) -> bool {
        matches!(self, DataDependenceOptions::NoBaseNoHeapNoCast | DataDependenceOptions::None)
    }

    /// Whether edges of `flavor` are tracked at this level.
    pub fn admits(self, flavor: DataFlavor) -> bool {
        match flavor {
            DataFlavor::Scalar => self != DataDependenceOptions::None,
            DataFlavor::BasePointer => !self.is_ignore_base_ptrs(),
            DataFlavor::Heap => !self.is_ignore_heap(),
            DataFlavor::Cast => !self.is_ignore_casts(),
        }
    }

    /// True when every flavor `other` admits is also admitted here.
    pub fn subsumes(self, other: DataDependenceOptions) -> bool {
        [DataFlavor::Scalar, DataFlavor::BasePointer, DataFlavor::Heap, DataFlavor::Cast]
            .into_iter()
            .all(|flavor| !other.admits(flavor) || self.admits(flavor))
    }
}

impl fmt::Display for DataDependenceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataDependenceOptions {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('-');
        Self::ALL.into_iter().find(|opt| opt.name() == wanted).ok_or_else(|| OptionParseError {
            kind: "data",
            value: s.to_string(),
            expected: Self::ALL.map(|o| o.name()).join(", "),
        })
    }
}

/// Control dependence is either computed fully or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlDependenceOptions {
    #[default]
    Full,
    None,
}

impl ControlDependenceOptions {
    pub const ALL: [ControlDependenceOptions; 2] =
        [ControlDependenceOptions::Full, ControlDependenceOptions::None];

    pub fn name(self) -> &'static str {
        match self {
            ControlDependenceOptions::Full => "full",
            ControlDependenceOptions::None => "none",
        }
    }

    pub fn is_enabled(self) -> bool {
        self == ControlDependenceOptions::Full
    }

    pub fn subsumes(self, other: ControlDependenceOptions) -> bool {
        self.is_enabled() || !other.is_enabled()
    }
}

impl fmt::Display for ControlDependenceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControlDependenceOptions {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('-');
        Self::ALL.into_iter().find(|opt| opt.name() == wanted).ok_or_else(|| OptionParseError {
            kind: "control",
            value: s.to_string(),
            expected: Self::ALL.map(|o| o.name()).join(", "),
        })
    }
}

/// Which edges and statements a traversal may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DependenceFilter {
    pub data: DataDependenceOptions,
    pub control: ControlDependenceOptions,
}

impl DependenceFilter {
    pub fn new(data: DataDependenceOptions, control: ControlDependenceOptions) -> Self {
        Self { data, control }
    }

    pub fn admits(&self, dependence: Dependence) -> bool {
        match dependence {
            Dependence::Control => self.control.is_enabled(),
            Dependence::Data(flavor) => self.data.admits(flavor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_with_optional_dash() {
        assert_eq!("full".parse::<DataDependenceOptions>(), Ok(DataDependenceOptions::Full));
        assert_eq!(
            "-no_base_no_heap_no_cast".parse::<DataDependenceOptions>(),
            Ok(DataDependenceOptions::NoBaseNoHeapNoCast)
        );
        assert_eq!("-none".parse::<ControlDependenceOptions>(), Ok(ControlDependenceOptions::None));
    }

    #[test]
    fn unknown_name_lists_valid_choices() {
        let err = "fancy".parse::<DataDependenceOptions>().unwrap_err();
        assert_eq!(err.value, "fancy");
        assert!(err.to_string().contains("no_base_ptrs"));
        assert!("partial".parse::<ControlDependenceOptions>().is_err());
    }

    #[test]
    fn every_level_is_subsumed_by_full() {
        for opt in DataDependenceOptions::ALL {
            assert!(DataDependenceOptions::Full.subsumes(opt), "{opt}");
            assert!(opt.subsumes(DataDependenceOptions::None), "{opt}");
        }
        assert!(!DataDependenceOptions::NoHeap.subsumes(DataDependenceOptions::NoBasePtrs));
        assert!(DataDependenceOptions::NoBasePtrs.subsumes(DataDependenceOptions::NoBaseNoHeap));
        assert!(!ControlDependenceOptions::None.subsumes(ControlDependenceOptions::Full));
    }

    #[test]
    fn flavor_admission_matches_level() {
        let opt = DataDependenceOptions::NoBasePtrs;
        assert!(opt.admits(DataFlavor::Heap));
        assert!(!opt.admits(DataFlavor::BasePointer));
        assert!(!DataDependenceOptions::None.admits(DataFlavor::Scalar));
        assert!(DataDependenceOptions::NoBaseNoHeap.admits(DataFlavor::Cast));
    }
}
