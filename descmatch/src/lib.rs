use cv_matching::ndarray::Array2;
use cv_matching::{descriptors_from_rows, DescriptorMatch, Matches};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}:{line}: {token:?} is not a number", path.display())]
    Number {
        path: PathBuf,
        line: usize,
        token: String,
    },
    #[error("{}: {source}", path.display())]
    Shape {
        path: PathBuf,
        #[source]
        source: cv_matching::Error,
    },
}

/// Reads a descriptor set with one descriptor per line.
///
/// Components are separated by commas and/or whitespace. Blank lines are skipped.
pub fn read_descriptors(path: impl AsRef<Path>) -> Result<Array2<f32>, ReadError> {
    let path = path.as_ref();
    let io_error = |source| ReadError::Io {
        path: path.to_owned(),
        source,
    };
    let file = std::fs::File::open(path).map_err(io_error)?;
    parse_descriptors(io::BufReader::new(file), path)
}

/// Parses the format of [`read_descriptors`]. `path` is only used for error messages.
pub fn parse_descriptors(
    reader: impl BufRead,
    path: &Path,
) -> Result<Array2<f32>, ReadError> {
    let mut rows: Vec<Vec<f32>> = vec![];
    for (ix, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| ReadError::Io {
            path: path.to_owned(),
            source,
        })?;
        let row = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<f32>().map_err(|_| ReadError::Number {
                    path: path.to_owned(),
                    line: ix + 1,
                    token: token.to_owned(),
                })
            })
            .collect::<Result<Vec<f32>, _>>()?;
        if !row.is_empty() {
            rows.push(row);
        }
    }
    descriptors_from_rows(&rows).map_err(|source| ReadError::Shape {
        path: path.to_owned(),
        source,
    })
}

/// Writes one `idx_a,idx_b,score` line per match.
pub fn write_matches(mut out: impl Write, matches: &Matches) -> io::Result<()> {
    for DescriptorMatch { a, b, score } in matches.iter() {
        writeln!(out, "{a},{b},{score}")?;
    }
    out.flush()
}
