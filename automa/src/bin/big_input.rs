use std::time::Instant;

use automa::{GraphBuilder, Runner, StateId, Verdict};

pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    // (0|1)*1(0|1)(0|1)(0|1), fourth symbol from the end is a 1
    let mut builder = GraphBuilder::<u8>::new();
    let s: Vec<StateId> = (0..5).map(|i| builder.add_state(format!("s{i}"))).collect();
    builder.add_transition(s[0], 0, s[0])?;
    builder.add_transition(s[0], 1, s[0])?;
    builder.add_transition(s[0], 1, s[1])?;
    for i in 1..4 {
        builder.add_transition(s[i], 0, s[i + 1])?;
        builder.add_transition(s[i], 1, s[i + 1])?;
    }
    builder.set_accept(s[4], true)?;
    builder.set_start(s[0])?;
    let graph = builder.build()?;

    let mut test = vec![1; 30_000_000];
    test.extend([0, 0, 0]);

    let start = Instant::now();
    let mut runner = Runner::new(&graph);
    assert_eq!(runner.run(test.iter().copied())?, Verdict::Accepted);
    test.push(1);
    runner.reset();
    assert_eq!(runner.run(test.iter().copied())?, Verdict::Rejected);

    println!("Big Input {:?}", start.elapsed());
    Ok(())
}
