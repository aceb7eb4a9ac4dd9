// crates/gm_grid/tests/mapping_tests.rs

//! 映射端到端测试
//!
//! 单雷达测试使用预先计算的笛卡尔库点位置，结果可以手工核对；
//! 多雷达测试使用天线坐标与方位等距投影。

use glam::DVec3;

use gm_config::{GridConfig, MappingConfig, ParallelStrategy, ProjectionConfig};
use gm_geo::Projection;
use gm_grid::prelude::*;

// ============================================================
// 辅助函数
// ============================================================

/// 单射线雷达，库点位置直接给出（相对雷达）
fn point_sensor(positions: Vec<DVec3>, values: Vec<f64>) -> SensorScan {
    let n = positions.len();
    SensorScan::new(
        "POINT",
        SensorLocation::fixed(0.0, 0.0, 0.0),
        vec![0.0],
        vec![0.0],
        vec![0.0; n],
    )
    .with_cartesian_gates(positions)
    .with_field("DBZ", MaskedField::from_finite(values))
    .unwrap()
}

fn flat_grid(n: usize, half: f64) -> GridConfig {
    GridConfig::new([1, n, n], [[0.0, 0.0], [-half, half], [-half, half]])
}

/// 36 条射线 × 40 个库的 PPI 扫描
fn ppi_sensor(name: &str, latitude: f64, longitude: f64, altitude: f64, seed: f64) -> SensorScan {
    let nrays = 36;
    let ngates = 40;
    let azimuth: Vec<f64> = (0..nrays).map(|r| r as f64 * 10.0).collect();
    let range: Vec<f64> = (0..ngates).map(|g| 500.0 + g as f64 * 500.0).collect();
    let mut dbz = Vec::with_capacity(nrays * ngates);
    let mut vel = Vec::with_capacity(nrays * ngates);
    for r in 0..nrays {
        for g in 0..ngates {
            dbz.push(seed + (r as f64 * 0.7).sin() * 10.0 + g as f64 * 0.25);
            vel.push(seed - (g as f64 * 0.3).cos() * 5.0);
        }
    }
    SensorScan::new(
        name,
        SensorLocation::fixed(latitude, longitude, altitude),
        azimuth,
        vec![0.5; nrays],
        range,
    )
    .with_field("DBZ", MaskedField::all_valid(dbz))
    .unwrap()
    .with_field("VEL", MaskedField::all_valid(vel))
    .unwrap()
}

fn network_config() -> MappingConfig {
    let grid = GridConfig::new(
        [3, 21, 21],
        [[0.0, 2000.0], [-20_000.0, 20_000.0], [-20_000.0, 20_000.0]],
    )
    .with_origin(36.0, -96.95)
    .with_origin_alt(300.0);
    MappingConfig::new(grid)
}

fn assert_bitwise_equal(a: &GridOutput, b: &GridOutput) {
    assert_eq!(a.fields.len(), b.fields.len());
    for (name, fa) in &a.fields {
        let fb = b.field(name).unwrap();
        assert_eq!(fa.valid(), fb.valid(), "场 {name} 有效性不同");
        for (x, y) in fa.values().iter().zip(fb.values()) {
            assert_eq!(x.to_bits(), y.to_bits(), "场 {name} 数值不同");
        }
    }
}

// ============================================================
// 单雷达
// ============================================================

#[test]
fn test_single_sample_identity_and_coverage() {
    let scan = point_sensor(vec![DVec3::ZERO], vec![42.0]);
    let config = MappingConfig::new(flat_grid(3, 1000.0)).with_constant_roi(1200.0);
    let output = map_gates_to_grid(&[scan], None, &config).unwrap();

    let dbz = output.field("DBZ").unwrap();
    assert_eq!(dbz.shape(), [1, 3, 3]);
    for j in 0..3 {
        for i in 0..3 {
            let corner = j != 1 && i != 1;
            match dbz.get(0, j, i) {
                // 角点距离 1414 m，超出半径
                None => assert!(corner, "({j},{i}) 应被覆盖"),
                Some(v) => {
                    assert!(!corner, "({j},{i}) 不应被覆盖");
                    assert!((v - 42.0).abs() < 1e-12);
                }
            }
        }
    }
    assert_eq!(dbz.n_valid(), 5);
    assert!(output.projection.is_none());
}

#[test]
fn test_equal_weight_average() {
    let scan = point_sensor(
        vec![DVec3::new(-200.0, 0.0, 0.0), DVec3::new(300.0, 0.0, 0.0)],
        vec![10.0, 30.0],
    );
    let config = MappingConfig::new(GridConfig::new(
        [1, 1, 1],
        [[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]],
    ))
    .with_constant_roi(500.0)
    .with_weighting("nearest");
    let output = map_gates_to_grid(&[scan], None, &config).unwrap();
    let v = output.field("DBZ").unwrap().get(0, 0, 0).unwrap();
    assert!((v - 20.0).abs() < 1e-12);
}

#[test]
fn test_cressman_closer_gate_dominates() {
    let scan = point_sensor(
        vec![DVec3::new(-100.0, 0.0, 0.0), DVec3::new(400.0, 0.0, 0.0)],
        vec![10.0, 30.0],
    );
    let config = MappingConfig::new(GridConfig::new(
        [1, 1, 1],
        [[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]],
    ))
    .with_constant_roi(500.0)
    .with_weighting("Cressman");
    let output = map_gates_to_grid(&[scan], None, &config).unwrap();
    let v = output.field("DBZ").unwrap().get(0, 0, 0).unwrap();

    let w1 = (500.0f64.powi(2) - 100.0f64.powi(2)) / (500.0f64.powi(2) + 100.0f64.powi(2));
    let w2 = (500.0f64.powi(2) - 400.0f64.powi(2)) / (500.0f64.powi(2) + 400.0f64.powi(2));
    let expected = (w1 * 10.0 + w2 * 30.0) / (w1 + w2);
    assert!((v - expected).abs() < 1e-9);
    assert!(v < 20.0);
}

#[test]
fn test_excluded_and_nan_gates_do_not_contribute() {
    let scan = point_sensor(
        vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(50.0, 0.0, 0.0),
            DVec3::new(-50.0, 0.0, 0.0),
        ],
        vec![10.0, f64::NAN, 1000.0],
    );
    let mut mask = ExclusionMask::include_all(1, 3);
    mask.exclude(0, 2);
    let config = MappingConfig::new(GridConfig::new(
        [1, 1, 1],
        [[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]],
    ))
    .with_constant_roi(500.0)
    .with_weighting("Nearest");
    let output = map_gates_to_grid(&[scan], Some(&[mask]), &config).unwrap();
    let v = output.field("DBZ").unwrap().get(0, 0, 0).unwrap();
    assert!((v - 10.0).abs() < 1e-12);
}

#[test]
fn test_all_masked_input_gives_all_missing() {
    let scan = point_sensor(
        vec![DVec3::ZERO, DVec3::new(100.0, 0.0, 0.0)],
        vec![f64::NAN, f64::NAN],
    );
    let config = MappingConfig::new(flat_grid(3, 500.0)).with_constant_roi(2000.0);
    let output = map_gates_to_grid(&[scan], None, &config).unwrap();
    let dbz = output.field("DBZ").unwrap();
    assert!(dbz.is_all_missing());
    assert!(dbz.values().iter().all(|v| v.is_nan()));
}

#[test]
fn test_gates_above_toa_ignored() {
    let scan = point_sensor(
        vec![DVec3::new(0.0, 0.0, 900.0), DVec3::new(0.0, 0.0, 1100.0)],
        vec![5.0, 50.0],
    );
    let grid = GridConfig::new([2, 1, 1], [[900.0, 1100.0], [0.0, 0.0], [0.0, 0.0]]);
    let config = MappingConfig::new(grid)
        .with_constant_roi(150.0)
        .with_toa(1000.0);
    let output = map_gates_to_grid(&[scan], None, &config).unwrap();
    let dbz = output.field("DBZ").unwrap();
    assert!((dbz.get(0, 0, 0).unwrap() - 5.0).abs() < 1e-12);
    assert_eq!(dbz.get(1, 0, 0), None);
}

#[test]
fn test_single_cell_axes() {
    let scan = point_sensor(vec![DVec3::new(0.0, 0.0, 1000.0)], vec![7.0]);
    // z 轴只有一个点，y/x 各两个点
    let grid = GridConfig::new([1, 2, 2], [[1000.0, 1000.0], [0.0, 100.0], [0.0, 100.0]]);
    let config = MappingConfig::new(grid).with_constant_roi(120.0);
    let output = map_gates_to_grid(&[scan], None, &config).unwrap();
    let dbz = output.field("DBZ").unwrap();
    assert_eq!(dbz.n_valid(), 3);
    assert_eq!(dbz.get(0, 1, 1), None);
}

#[test]
fn test_roi_grid_optional() {
    let scan = point_sensor(vec![DVec3::ZERO], vec![1.0]);
    let mut config = MappingConfig::new(flat_grid(5, 10_000.0)).with_roi_func("dist_beam");
    let output = map_gates_to_grid(&[scan.clone()], None, &config).unwrap();
    let roi = output.roi.as_ref().unwrap();
    assert_eq!(roi.n_valid(), 25);
    // 雷达位于网格中心，半径随距离不减
    let center = roi.get(0, 2, 2).unwrap();
    let edge = roi.get(0, 2, 4).unwrap();
    assert!(center >= 500.0);
    assert!(edge >= center);

    config.map_roi = false;
    let output = map_gates_to_grid(&[scan], None, &config).unwrap();
    assert!(output.roi.is_none());
}

#[test]
fn test_max_space_radius() {
    // 4 条射线，末端库点位于 (±1000, 0) 和 (0, ±1000)
    let positions = vec![
        DVec3::new(0.0, 500.0, 0.0),
        DVec3::new(0.0, 1000.0, 0.0),
        DVec3::new(500.0, 0.0, 0.0),
        DVec3::new(1000.0, 0.0, 0.0),
        DVec3::new(0.0, -500.0, 0.0),
        DVec3::new(0.0, -1000.0, 0.0),
        DVec3::new(-500.0, 0.0, 0.0),
        DVec3::new(-1000.0, 0.0, 0.0),
    ];
    let scan = SensorScan::new(
        "MS",
        SensorLocation::fixed(0.0, 0.0, 0.0),
        vec![0.0, 90.0, 180.0, 270.0],
        vec![0.0; 4],
        vec![500.0, 1000.0],
    )
    .with_cartesian_gates(positions)
    .with_field("DBZ", MaskedField::all_valid(vec![1.0; 8]))
    .unwrap();
    let config = MappingConfig::new(flat_grid(3, 1000.0)).with_roi_func("max_space");
    let output = map_gates_to_grid(&[scan], None, &config).unwrap();
    let expected = 8.0 / 3.0 * 2f64.sqrt() * 1000.0;
    let roi = output.roi.unwrap();
    assert!(roi.values().iter().all(|r| (r - expected).abs() < 1e-6));
}

// ============================================================
// 错误与警告
// ============================================================

#[test]
fn test_max_space_needs_two_rays() {
    let scan = point_sensor(vec![DVec3::ZERO, DVec3::new(0.0, 500.0, 0.0)], vec![1.0, 2.0]);
    let config = MappingConfig::new(flat_grid(3, 1000.0)).with_roi_func("max_space");
    let err = map_gates_to_grid(&[scan], None, &config).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_filter_count_must_match() {
    let a = ppi_sensor("A", 36.0, -97.0, 300.0, 0.0);
    let b = ppi_sensor("B", 36.0, -96.9, 310.0, 5.0);
    let filters = vec![ExclusionMask::include_all(a.nrays(), a.ngates())];
    let err = map_gates_to_grid(&[a, b], Some(&filters), &network_config()).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_unknown_names_rejected() {
    let scan = point_sensor(vec![DVec3::ZERO], vec![1.0]);
    let config = MappingConfig::new(flat_grid(3, 1000.0)).with_weighting("gaussian");
    assert!(map_gates_to_grid(&[scan.clone()], None, &config).unwrap_err().is_config());

    let config = MappingConfig::new(flat_grid(3, 1000.0)).with_roi_func("adaptive");
    assert!(map_gates_to_grid(&[scan], None, &config).unwrap_err().is_config());
}

#[test]
fn test_missing_field_warns_and_is_missing() {
    let scan = point_sensor(vec![DVec3::ZERO], vec![3.0]);
    let config = MappingConfig::new(flat_grid(3, 1000.0))
        .with_constant_roi(1500.0)
        .with_fields(["DBZ", "ZDR"]);
    let output = map_gates_to_grid(&[scan], None, &config).unwrap();

    assert!(output.warnings.iter().any(|w| matches!(
        w,
        MappingWarning::MissingField { sensor, field } if sensor == "POINT" && field == "ZDR"
    )));
    assert!(output.field("ZDR").unwrap().is_all_missing());
    assert_eq!(output.field("DBZ").unwrap().n_valid(), 9);
}

#[test]
fn test_barnes_deprecation_warning() {
    let scan = point_sensor(vec![DVec3::ZERO], vec![3.0]);
    let config = MappingConfig::new(flat_grid(3, 1000.0))
        .with_constant_roi(1500.0)
        .with_weighting("BARNES");
    let output = map_gates_to_grid(&[scan], None, &config).unwrap();
    assert!(output
        .warnings
        .iter()
        .any(|w| matches!(w, MappingWarning::DeprecatedWeighting { function, .. } if function == "Barnes")));
    assert!((output.field("DBZ").unwrap().get(0, 1, 1).unwrap() - 3.0).abs() < 1e-12);
}

#[test]
fn test_single_sensor_with_projection_is_projected() {
    let grid = GridConfig::new([1, 11, 11], [[0.0, 0.0], [-10_000.0, 10_000.0], [-10_000.0, 10_000.0]]);
    let scan = ppi_sensor("KAAA", 36.0, -97.0, 300.0, 0.0);

    let local = MappingConfig::new(grid.clone()).with_constant_roi(1200.0);
    let local_out = map_gates_to_grid(&[scan.clone()], None, &local).unwrap();
    assert!(local_out.projection.is_none());

    // 只给出投影、不给原点时仍执行地理转换，投影中心取雷达位置
    let projected = MappingConfig::new(grid.with_projection(ProjectionConfig::Aeqd {
        lat_0: None,
        lon_0: None,
    }))
    .with_constant_roi(1200.0);
    let out = map_gates_to_grid(&[scan], None, &projected).unwrap();
    assert_eq!(out.projection, Some(Projection::aeqd(-97.0, 36.0)));
    assert_eq!(out.origin.latitude, 36.0);
    assert_eq!(out.origin.longitude, -97.0);
    assert_eq!(out.origin.altitude, 300.0);

    // 雷达位于网格中心，两种路径在中心单元给出几乎相同的值
    let a = local_out.field("DBZ").unwrap().get(0, 5, 5).unwrap();
    let b = out.field("DBZ").unwrap().get(0, 5, 5).unwrap();
    assert!((a - b).abs() < 1e-3, "{a} vs {b}");
}

// ============================================================
// 多雷达与确定性
// ============================================================

#[test]
fn test_network_mapping_uses_projection() {
    let a = ppi_sensor("KAAA", 36.0, -97.0, 300.0, 0.0);
    let b = ppi_sensor("KBBB", 36.0, -96.9, 310.0, 5.0);
    let output = map_gates_to_grid(&[a, b], None, &network_config()).unwrap();

    assert!(output.projection.is_some());
    assert_eq!(output.origin.altitude, 300.0);
    assert_eq!(output.field_names().collect::<Vec<_>>(), vec!["DBZ", "VEL"]);
    let dbz = output.field("DBZ").unwrap();
    assert!(dbz.n_valid() > 0);
    // 库点最高约 400 m，2000 m 层无覆盖
    for j in 0..21 {
        for i in 0..21 {
            assert_eq!(dbz.get(2, j, i), None);
        }
    }
    assert!(output.warnings.is_empty());
}

#[test]
fn test_sensor_order_does_not_change_result() {
    let a = ppi_sensor("KAAA", 36.0, -97.0, 300.0, 0.0);
    let b = ppi_sensor("KBBB", 36.0, -96.9, 310.0, 5.0);
    let config = network_config().with_weighting("Barnes2");

    let ab = map_gates_to_grid(&[a.clone(), b.clone()], None, &config).unwrap();
    let ba = map_gates_to_grid(&[b, a], None, &config).unwrap();
    assert_bitwise_equal(&ab, &ba);
    assert_eq!(ab.roi, ba.roi);
}

#[test]
fn test_sequential_and_parallel_identical() {
    let a = ppi_sensor("KAAA", 36.0, -97.0, 300.0, 0.0);
    let b = ppi_sensor("KBBB", 36.0, -96.9, 310.0, 5.0);
    let sensors = [a, b];

    let mut config = network_config().with_parallel(ParallelStrategy::Sequential);
    config.parallel.rays_per_partition = 7;
    let seq = map_gates_to_grid(&sensors, None, &config).unwrap();

    let config = config.with_parallel(ParallelStrategy::Parallel);
    let par = map_gates_to_grid(&sensors, None, &config).unwrap();
    assert_bitwise_equal(&seq, &par);
}

#[test]
fn test_filters_apply_per_sensor() {
    let a = ppi_sensor("KAAA", 36.0, -97.0, 300.0, 0.0);
    let b = ppi_sensor("KBBB", 36.0, -96.9, 310.0, 5.0);
    let mut fa = ExclusionMask::include_all(a.nrays(), a.ngates());
    let fb = ExclusionMask::include_all(b.nrays(), b.ngates());
    fa.exclude_where(&a.fields["DBZ"], |_| true).unwrap();
    assert_eq!(fa.n_excluded(), a.n_gates_total());

    let config = network_config();
    let only_b = map_gates_to_grid(&[a, b.clone()], Some(&[fa, fb]), &config).unwrap();
    // 原点与海拔显式给出，单独映射 b 的网格位置一致
    let b_alone = map_gates_to_grid(&[b], None, &config).unwrap();
    assert_bitwise_equal(&only_b, &b_alone);
}

#[test]
fn test_gate_mapper_reusable_with_json_config() {
    let json = r#"{
        "grid": {
            "shape": [1, 11, 11],
            "limits": [[0.0, 0.0], [-10000.0, 10000.0], [-10000.0, 10000.0]],
            "origin": {"latitude": 36.0, "longitude": -97.0},
            "origin_alt": 300.0
        },
        "weighting_function": "cressman",
        "roi_func": "dist",
        "fields": ["DBZ"],
        "parallel": {"strategy": "parallel", "rays_per_partition": 10}
    }"#;
    let config = MappingConfig::from_json_str(json).unwrap();
    let mapper = GateMapper::new(config).unwrap();
    let scan = ppi_sensor("KAAA", 36.0, -97.0, 300.0, 0.0);

    let first = mapper.map(std::slice::from_ref(&scan), None).unwrap();
    let second = mapper.map(std::slice::from_ref(&scan), None).unwrap();
    assert_bitwise_equal(&first, &second);
    assert_eq!(first.field_names().collect::<Vec<_>>(), vec!["DBZ"]);
    assert!(first.field("DBZ").unwrap().n_valid() > 20);
}
