use crate::algorithms::SeparatorStats;
use crate::graph::Graph;
use sprs::io::read_matrix_market;
use sprs::TriMatI;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Read a Matrix Market file as a graph with unit vertex weights.
///
/// The entries are read as f64 and fall back to i64 for integer files.
/// The result is raw storage; run it through
/// [`crate::conditioning::condition`] before partitioning.
pub fn read_matrix_market_as_graph(
    file_path: &Path,
) -> Result<Graph, Box<dyn std::error::Error>> {
    let triplets: TriMatI<f64, usize> = match read_matrix_market(file_path) {
        Ok(triplets) => triplets,
        Err(_) => {
            // Retry as an integer matrix and widen the values.
            let integers: TriMatI<i64, usize> = read_matrix_market(file_path)?;
            let mut widened = TriMatI::new((integers.rows(), integers.cols()));
            for (value, (row, col)) in integers.triplet_iter() {
                widened.add_triplet(row, col, *value as f64);
            }
            widened
        }
    };

    Ok(Graph::with_unit_weights(triplets.to_csr())?)
}

/// Write the separator report used by the demo and test harnesses: the
/// input name, elapsed time, cut cost and imbalance, then one `id A|B`
/// line per vertex.
pub fn write_separator_report(
    file_path: &Path,
    input_name: &str,
    elapsed: Duration,
    stats: &SeparatorStats,
    partition: &[usize],
) -> Result<(), std::io::Error> {
    let mut file = File::create(file_path)?;
    writeln!(file, "input: {input_name}")?;
    writeln!(file, "total time: {:.6}s", elapsed.as_secs_f64())?;
    writeln!(file, "cut cost: {}", stats.cut_cost)?;
    writeln!(file, "imbalance: {}", stats.imbalance)?;
    for (vertex, &block) in partition.iter().enumerate() {
        writeln!(file, "{} {}", vertex, if block == 0 { "A" } else { "B" })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn create_mock_file(dir: &Path, filename: &str, content: &str) -> std::path::PathBuf {
        let file_path = dir.join(filename);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_read_matrix_market_real() {
        // Arrange
        let temp_dir = tempdir().unwrap();
        let content = "\
%%MatrixMarket matrix coordinate real general
%
3 3 4
1 2 1.5
2 1 1.5
2 3 2.0
3 2 2.0";
        let file_path = create_mock_file(temp_dir.path(), "real.mtx", content);

        // Act
        let graph = read_matrix_market_as_graph(&file_path).unwrap();

        // Assert
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.nnz(), 4);
        assert_eq!(graph.adjacency.get(0, 1), Some(&1.5));
        assert_eq!(graph.vertex_weights, vec![1.0; 3]);
    }

    #[test]
    fn test_read_matrix_market_integer() {
        // Arrange
        let temp_dir = tempdir().unwrap();
        let content = "\
%%MatrixMarket matrix coordinate integer general
%
2 2 2
1 2 3
2 1 3";
        let file_path = create_mock_file(temp_dir.path(), "integer.mtx", content);

        // Act
        let graph = read_matrix_market_as_graph(&file_path).unwrap();

        // Assert
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.adjacency.get(0, 1), Some(&3.0));
    }

    #[test]
    fn test_write_separator_report() {
        // Arrange
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("report.txt");
        let stats = SeparatorStats {
            cut_cost: 2.0,
            block_weights: [2.0, 2.0],
            imbalance: 0.0,
            levels: 1,
        };
        let partition = [0, 1, 0, 1];

        // Act
        write_separator_report(
            &file_path,
            "mock.mtx",
            Duration::from_millis(1500),
            &stats,
            &partition,
        )
        .unwrap();

        // Assert
        let written = fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "input: mock.mtx");
        assert_eq!(lines[1], "total time: 1.500000s");
        assert_eq!(lines[2], "cut cost: 2");
        assert_eq!(lines[3], "imbalance: 0");
        assert_eq!(lines[4], "0 A");
        assert_eq!(lines[5], "1 B");
        assert_eq!(lines.len(), 8);
    }
}
