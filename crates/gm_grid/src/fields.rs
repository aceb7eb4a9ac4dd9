// crates/gm_grid/src/fields.rs

//! 场提取
//!
//! 把每部雷达的多个场整理成 (nrays × ngates × nfields) 的稠密缓冲，
//! 热循环按库点连续读取所有场的值和有效位。

use std::collections::BTreeSet;

use crate::output::MappingWarning;
use crate::sensor::SensorScan;

/// 确定待映射的场
///
/// 显式给出时原样使用；否则取所有雷达共有的场，按名称排序，
/// 保证输入顺序不影响结果。
pub fn determine_fields(requested: Option<&[String]>, sensors: &[SensorScan]) -> Vec<String> {
    if let Some(fields) = requested {
        return fields.to_vec();
    }

    let mut iter = sensors.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let mut common: BTreeSet<&str> = first.fields.keys().map(String::as_str).collect();
    for sensor in iter {
        common.retain(|name| sensor.fields.contains_key(*name));
    }
    common.into_iter().map(str::to_string).collect()
}

/// 单部雷达的稠密场缓冲
#[derive(Debug, Clone)]
pub struct FieldBuffer {
    nfields: usize,
    values: Vec<f64>,
    valid: Vec<bool>,
}

impl FieldBuffer {
    /// 从雷达扫描中提取
    ///
    /// 雷达缺少某个场时该场全部标记为无效，并记录警告。
    pub fn extract(sensor: &SensorScan, fields: &[String], warnings: &mut Vec<MappingWarning>) -> Self {
        let n_gates = sensor.n_gates_total();
        let nfields = fields.len();
        let mut values = vec![0.0; n_gates * nfields];
        let mut valid = vec![false; n_gates * nfields];

        for (f, name) in fields.iter().enumerate() {
            let Some(field) = sensor.fields.get(name) else {
                log::warn!("雷达 {} 缺少场 {}，跳过其贡献", sensor.name, name);
                warnings.push(MappingWarning::MissingField {
                    sensor: sensor.name.clone(),
                    field: name.clone(),
                });
                continue;
            };
            for (g, (&v, &ok)) in field.data().iter().zip(field.valid()).enumerate() {
                values[g * nfields + f] = v;
                valid[g * nfields + f] = ok;
            }
        }

        Self {
            nfields,
            values,
            valid,
        }
    }

    /// 场个数
    #[inline]
    pub fn nfields(&self) -> usize {
        self.nfields
    }

    /// 第 g 个库点所有场的值
    #[inline]
    pub fn gate_values(&self, g: usize) -> &[f64] {
        &self.values[g * self.nfields..(g + 1) * self.nfields]
    }

    /// 第 g 个库点所有场的有效位
    #[inline]
    pub fn gate_valid(&self, g: usize) -> &[bool] {
        &self.valid[g * self.nfields..(g + 1) * self.nfields]
    }
}
