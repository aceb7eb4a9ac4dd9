// crates/gm_grid/src/finalize.rs

//! 归一化与诊断网格

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::accumulator::GridAccumulator;
use crate::grid::GridGeometry;
use crate::output::GriddedField;
use crate::roi::RoiFunction;

/// 由加权和得到各场的网格值
///
/// 权重和为 0 的单元为缺测，不做除法。
pub fn finalize_fields(
    acc: &GridAccumulator,
    fields: &[String],
    shape: [usize; 3],
) -> BTreeMap<String, GriddedField> {
    let nfields = acc.nfields();
    let n_cells = acc.n_cells();

    fields
        .iter()
        .enumerate()
        .map(|(f, name)| {
            let mut values = vec![f64::NAN; n_cells];
            let mut valid = vec![false; n_cells];
            for cell in 0..n_cells {
                let w = acc.wsum()[cell * nfields + f];
                if w > 0.0 {
                    values[cell] = acc.sum()[cell * nfields + f] / w;
                    valid[cell] = true;
                }
            }
            (name.clone(), GriddedField::from_parts(shape, values, valid))
        })
        .collect()
}

/// 每个单元的影响半径（按 z 层并行）
pub fn compute_roi_grid(geometry: &GridGeometry, roi: &RoiFunction) -> GriddedField {
    let [nz, ny, nx] = geometry.shape();
    let mut values = vec![0.0; geometry.n_cells()];
    values
        .par_chunks_mut(ny * nx)
        .enumerate()
        .for_each(|(k, slice)| {
            for j in 0..ny {
                for i in 0..nx {
                    slice[j * nx + i] = roi.radius_at(geometry.cell_center(k, j, i));
                }
            }
        });
    debug_assert_eq!(values.len(), nz * ny * nx);
    GriddedField::dense([nz, ny, nx], values)
}
