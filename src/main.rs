use edgesep::algorithms::compute_edge_separator;
use edgesep::conditioning::condition;
use edgesep::io::{read_matrix_market_as_graph, write_separator_report};
use edgesep::options::Options;
use std::path::Path;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("usage: edgesep <matrix.mtx> [report.txt]");
        std::process::exit(1);
    };
    let report = args.next();

    let raw = read_matrix_market_as_graph(Path::new(&input))?;
    let graph = condition(&raw)?;
    let options = Options::default();
    let mut partition = vec![0; graph.len()];

    let start = Instant::now();
    let stats = compute_edge_separator(&graph, &options, &mut partition)?;
    let elapsed_time = start.elapsed();

    println!("Cut cost {:?}", stats.cut_cost);
    println!("Imbalance {:?}", stats.imbalance);
    println!("Levels {:?}", stats.levels);
    println!("Execution time {:?}", elapsed_time);

    if let Some(report) = report {
        write_separator_report(Path::new(&report), &input, elapsed_time, &stats, &partition)?;
    }
    Ok(())
}
