mod common;

use common::{demo_program, sig, Analysis};
use sdg_core::model::{InstructionKind, Method, Program, VOID};
use sdg_core::present::{render_dot, StatementLabeler};
use sdg_core::prune::prune;
use sdg_core::sdg::{ControlDependenceOptions, DataDependenceOptions, Slice, Statement};
use sdg_core::slicer::{Direction, Slicer};

/// One method with a hundred instructions, only two of which matter to the seed.
fn wide_program() -> Program {
    let mut main = Method::new(sig("Wide", "main", &["String[]"], VOID), vec![1])
        .with(InstructionKind::Const { def: 2, literal: Some("3".into()) })
        .with(InstructionKind::Unary { def: 3, operator: "-".into(), operand: 2 });
    for value in 4..102 {
        main = main.with(InstructionKind::Const { def: value, literal: None });
    }
    main = main.with(InstructionKind::Return { value: None });
    Program::from_parts(vec![], vec![main])
}

#[test]
fn pruning_keeps_only_slice_statements_and_their_edges() {
    let analysis = Analysis::new(wide_program(), "Wide");
    let sdg = analysis.full_sdg();
    assert!(sdg.statement_count() > 100);

    let n = analysis.node("Wide.main(String[])void");
    let seed = Statement::Normal { node: n, index: 1 };
    let slice = Slicer::new(&sdg)
        .compute_slice(&seed, Direction::Backward, DataDependenceOptions::Full, ControlDependenceOptions::Full)
        .expect("slice");
    let expected = [
        Statement::MethodEntry { node: n },
        Statement::Normal { node: n, index: 0 },
        Statement::Normal { node: n, index: 1 },
    ];
    assert_eq!(slice, expected.iter().cloned().collect::<Slice>());

    let pruned = prune(&sdg, &slice).expect("prune");
    assert_eq!(pruned.node_count(), 3);
    assert_eq!(pruned.edge_count(), 3);
    assert!(expected.iter().all(|s| pruned.contains(s)));
    assert!(pruned.edges().all(|(from, to, _)| slice.contains(from) && slice.contains(to)));
}

#[test]
fn pruned_graph_matches_slice_size_for_every_option() {
    let analysis = Analysis::new(demo_program(), "Demo");
    let sdg = analysis.full_sdg();
    let main = analysis.node("Demo.main(String[])void");
    let slicer = Slicer::new(&sdg);
    for data in DataDependenceOptions::ALL {
        for control in ControlDependenceOptions::ALL {
            let slice = slicer
                .compute_slice(&Statement::Normal { node: main, index: 5 }, Direction::Backward, data, control)
                .expect("slice");
            let pruned = prune(&sdg, &slice).expect("prune");
            assert_eq!(pruned.node_count(), slice.len(), "{data}/{control}");
        }
    }
}

#[test]
fn pruning_a_foreign_statement_fails() {
    let analysis = Analysis::new(wide_program(), "Wide");
    let sdg = analysis.full_sdg();
    let n = analysis.node("Wide.main(String[])void");
    let slice = [Statement::Normal { node: n, index: 999 }].into_iter().collect();
    assert!(prune(&sdg, &slice).is_err());
}

#[test]
fn dot_output_has_one_node_per_statement() {
    let analysis = Analysis::new(demo_program(), "Demo");
    let sdg = analysis.full_sdg();
    let main = analysis.node("Demo.main(String[])void");
    let slice = Slicer::new(&sdg)
        .compute_slice(
            &Statement::Normal { node: main, index: 2 },
            Direction::Backward,
            DataDependenceOptions::Full,
            ControlDependenceOptions::Full,
        )
        .expect("slice");
    let pruned = prune(&sdg, &slice).expect("prune");
    let labeler = StatementLabeler::new(&analysis.program, &analysis.cg);
    let dot = render_dot(&pruned, &labeler);

    assert!(dot.starts_with("digraph Slice {"));
    assert!(dot.trim_end().ends_with('}'));
    assert_eq!(dot.matches("[label=").count(), pruned.node_count() + pruned.edge_count());
    assert!(dot.contains("label=\"heap\""));
    assert!(dot.contains("Demo.main(String[])void"));
}

#[test]
fn source_lines_group_by_class_and_method() {
    let analysis = Analysis::new(demo_program(), "Demo");
    let sdg = analysis.full_sdg();
    let main = analysis.node("Demo.main(String[])void");
    let slice = Slicer::new(&sdg)
        .compute_slice(
            &Statement::Normal { node: main, index: 5 },
            Direction::Backward,
            DataDependenceOptions::Full,
            ControlDependenceOptions::None,
        )
        .expect("slice");
    let labeler = StatementLabeler::new(&analysis.program, &analysis.cg);
    let table = labeler.source_line_table(&slice);

    let demo = table.get("Demo").expect("Demo class");
    let main_lines: Vec<u32> = demo["Demo.main(String[])void"].iter().copied().collect();
    // the call to compute is only reachable through control dependence
    assert_eq!(main_lines, vec![5, 7, 10]);
    let helper_lines: Vec<u32> = demo["Demo.helper(Counter)void"].iter().copied().collect();
    assert_eq!(helper_lines, vec![18, 19]);
    assert!(!demo.contains_key("Demo.compute(Counter)void"));

    let dump = labeler.dump_slice(&slice);
    assert_eq!(dump.len(), slice.len());
    assert!(dump.iter().all(|line| !line.contains('\n')));
}
