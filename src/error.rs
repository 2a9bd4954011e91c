// error.rs: Fatal pipeline errors.
// Copyright (C) 2015  Kenny Chan
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

use std::io;
use std::path::{Path, PathBuf};

use handlebars::{RenderError, TemplateError};
use thiserror::Error;

/// Anything that stops the pipeline. Row-level problems are logged and
/// skipped instead, they never become a `PipelineError`.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{} not found", path.display())]
    MissingInputFile { path: PathBuf },
    #[error("no Unicode mapping files found matching {}/*.txt", dir.display())]
    NoMappingFiles { dir: PathBuf },
    #[error("cannot list {}: {source}", dir.display())]
    ListDir { dir: PathBuf, source: walkdir::Error },
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid table template: {0}")]
    Template(#[from] TemplateError),
    #[error("cannot render table: {0}")]
    Render(#[from] RenderError),
}

impl PipelineError {
    /// Classifies an error raised while opening or reading `path`. A file that
    /// does not exist is reported as a missing input.
    pub fn read(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            PipelineError::MissingInputFile { path: path.to_owned() }
        } else {
            PipelineError::Read { path: path.to_owned(), source }
        }
    }

    pub fn write(path: &Path, source: io::Error) -> Self {
        PipelineError::Write { path: path.to_owned(), source }
    }
}

#[test]
fn test_not_found_is_missing_input() {
    let err = PipelineError::read(Path::new("data/CNS_source.txt"),
                                  io::Error::new(io::ErrorKind::NotFound, "gone"));
    match err {
        PipelineError::MissingInputFile { ref path } => assert_eq!(path, Path::new("data/CNS_source.txt")),
        ref e => panic!("unexpected error {:?}", e),
    }
    assert_eq!(err.to_string(), "data/CNS_source.txt not found");
}

#[test]
fn test_other_read_failure_keeps_source() {
    let err = PipelineError::read(Path::new("tmp/pass2.csv"),
                                  io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"));
    assert_eq!(err.to_string(), "cannot read tmp/pass2.csv: stream did not contain valid UTF-8");
}
