// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! CSV snapshots of a state
//!
//! ```text
//! id,x,y,z,vx,vy,vz,mass
//! 0,0.25,-0.5,0,0.01,0.02,0,1.5
//! ```
//!
//! Values use the shortest representation that parses back to the same
//! `f64`, so a written snapshot reads back bit-for-bit. Accelerations are
//! not stored.

use crate::error::{Result, SimError};
use crate::state::{Body, BodyState, Dimension};
use log::debug;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Header line of every snapshot
pub const HEADER: &str = "id,x,y,z,vx,vy,vz,mass";

const COLUMNS: usize = 8;

/// Write `state` as CSV
///
/// In 2D mode z and vz are written as 0.
pub fn write_snapshot<W: Write>(mut writer: W, state: &BodyState) -> Result<()> {
    let spatial = state.dimension().is_3d();
    writeln!(writer, "{}", HEADER)?;
    for (id, body) in state.bodies().enumerate() {
        let [x, y, z] = body.position;
        let [vx, vy, vz] = body.velocity;
        let (z, vz) = if spatial { (z, vz) } else { (0.0, 0.0) };
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{}",
            id, x, y, z, vx, vy, vz, body.mass
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse a snapshot produced by [`write_snapshot`]
///
/// Blank lines are ignored. Ids must count up from 0 without gaps.
///
/// # Errors
///
/// [`SimError::SnapshotParse`] with the 1-based line number for a bad
/// header, a wrong column count, an unparsable value or an out-of-sequence
/// id; [`SimError::EmptySystem`] if there are no rows.
pub fn read_snapshot<R: BufRead>(reader: R, dimension: Dimension) -> Result<BodyState> {
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, header)) => header?,
        None => return Err(SimError::parse(1, "missing header")),
    };
    if header.trim() != HEADER {
        return Err(SimError::parse(1, format!("expected header `{}`", HEADER)));
    }

    let mut bodies = Vec::new();
    for (index, line) in lines {
        let line = line?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != COLUMNS {
            return Err(SimError::parse(
                line_no,
                format!("expected {} columns, found {}", COLUMNS, fields.len()),
            ));
        }

        let id: usize = fields[0]
            .parse()
            .map_err(|_| SimError::parse(line_no, format!("invalid id `{}`", fields[0])))?;
        if id != bodies.len() {
            return Err(SimError::parse(
                line_no,
                format!("expected id {}, found {}", bodies.len(), id),
            ));
        }

        let mut values = [0.0; COLUMNS - 1];
        for (value, field) in values.iter_mut().zip(&fields[1..]) {
            *value = field
                .parse()
                .map_err(|_| SimError::parse(line_no, format!("invalid number `{}`", field)))?;
        }
        let [x, y, z, vx, vy, vz, mass] = values;
        bodies.push(Body::new([x, y, z], [vx, vy, vz], mass));
    }

    BodyState::from_bodies(&bodies, dimension)
}

/// Path of a snapshot file inside `dir`
///
/// `Some(step)` gives `<strategy>_<step:06>.csv`; `None` gives the final
/// snapshot `<strategy>_final.csv`.
pub fn snapshot_path(dir: &Path, strategy: &str, step: Option<usize>) -> PathBuf {
    match step {
        Some(step) => dir.join(format!("{}_{:06}.csv", strategy, step)),
        None => dir.join(format!("{}_final.csv", strategy)),
    }
}

/// Write `state` to `path`, creating the parent directory if needed
pub fn write_snapshot_file(path: &Path, state: &BodyState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_snapshot(BufWriter::new(File::create(path)?), state)?;
    debug!("wrote snapshot {}", path.display());
    Ok(())
}

/// Read a snapshot file written by [`write_snapshot_file`]
pub fn read_snapshot_file(path: &Path, dimension: Dimension) -> Result<BodyState> {
    read_snapshot(BufReader::new(File::open(path)?), dimension)
}
