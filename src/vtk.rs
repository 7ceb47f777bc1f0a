//! VTK output of a pitched slab.
//!
//! Writes the tents of a slab as space-time line cells in legacy ASCII
//! VTK: the tentpole plus the top-front edges to each neighbour vertex,
//! with the tent index and DAG level as cell data. The first spatial
//! coordinate goes on the x-axis and time on the y-axis, which renders 1-D
//! slabs as the familiar tent diagrams; higher-dimensional meshes dump the
//! same skeleton with their first coordinate.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::mesh::MeshAccess;
use crate::tent::TentPitchedSlab;

/// Error type for VTK output.
#[derive(Debug, Error)]
pub enum VtkError {
    /// File could not be created or written.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Nothing to write.
    #[error("slab has no tents")]
    EmptySlab,
}

/// Write the slab's tents to `path` in legacy ASCII VTK.
pub fn write_tents_vtk<M: MeshAccess>(
    slab: &TentPitchedSlab,
    mesh: &M,
    path: &Path,
) -> Result<(), VtkError> {
    if slab.tents.is_empty() {
        return Err(VtkError::EmptySlab);
    }

    let mut points: Vec<(f64, f64)> = Vec::new();
    let mut lines: Vec<[usize; 2]> = Vec::new();
    let mut cell_tent: Vec<usize> = Vec::new();
    let mut cell_level: Vec<usize> = Vec::new();

    for (ti, tent) in slab.tents.iter().enumerate() {
        let xv = mesh.vertex_coords(tent.vertex)[0];
        let bot = points.len();
        points.push((xv, tent.tbot));
        let top = points.len();
        points.push((xv, tent.ttop));
        lines.push([bot, top]);
        cell_tent.push(ti);
        cell_level.push(tent.level);

        for (nb, &nbt) in tent.nbv.iter().zip(tent.nbtime.iter()) {
            let xn = mesh.vertex_coords(*nb)[0];
            let p = points.len();
            points.push((xn, nbt));
            lines.push([top, p]);
            cell_tent.push(ti);
            cell_level.push(tent.level);
        }
    }

    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    writeln!(w, "# vtk DataFile Version 3.0")?;
    writeln!(w, "tent pitched slab")?;
    writeln!(w, "ASCII")?;
    writeln!(w, "DATASET UNSTRUCTURED_GRID")?;
    writeln!(w, "POINTS {} double", points.len())?;
    for (x, t) in &points {
        writeln!(w, "{} {} 0", x, t)?;
    }
    writeln!(w, "CELLS {} {}", lines.len(), 3 * lines.len())?;
    for [a, b] in &lines {
        writeln!(w, "2 {} {}", a, b)?;
    }
    writeln!(w, "CELL_TYPES {}", lines.len())?;
    for _ in &lines {
        writeln!(w, "3")?; // VTK_LINE
    }
    writeln!(w, "CELL_DATA {}", lines.len())?;
    writeln!(w, "SCALARS tent int 1")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for t in &cell_tent {
        writeln!(w, "{}", t)?;
    }
    writeln!(w, "SCALARS level int 1")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for l in &cell_level {
        writeln!(w, "{}", l)?;
    }

    Ok(())
}
