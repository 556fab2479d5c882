use std::f64::consts::TAU;

use massing::building::VoxelBuilding;
use massing::geometry::Polygon;
use massing::math::Point2;
use massing::operations::arbitration::{simplify_buildings, BatchConfig};
use massing::MassingError;

fn rect(x0: f64, y0: f64, w: f64, h: f64) -> Polygon {
    Polygon::new(
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + w, y0),
            Point2::new(x0 + w, y0 + h),
            Point2::new(x0, y0 + h),
        ],
        vec![],
    )
}

/// Circle sampled on a unit grid, as a voxel mask would produce it.
fn pixel_circle(r: f64, n: u32) -> Polygon {
    let pts = (0..n)
        .map(|i| {
            let a = TAU * f64::from(i) / f64::from(n);
            Point2::new((r * a.cos()).round(), (r * a.sin()).round())
        })
        .collect();
    Polygon::new(pts, vec![])
}

fn podium_with_tower(id: usize) -> VoxelBuilding {
    let mut slices = vec![vec![rect(0.0, 0.0, 40.0, 30.0)]; 5];
    slices.extend(vec![vec![rect(12.0, 8.0, 14.0, 14.0)]; 20]);
    VoxelBuilding::new(id, slices)
}

fn cylinder(id: usize) -> VoxelBuilding {
    VoxelBuilding::new(id, vec![vec![pixel_circle(25.0, 200)]; 12])
}

fn main() -> Result<(), MassingError> {
    // Default: WARN for everything, INFO for massing.
    // Override with RUST_LOG env var (e.g. RUST_LOG=massing=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("simplify=info".parse().unwrap_or_default())
        .add_directive("massing=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let buildings = vec![podium_with_tower(0), cylinder(1)];
    let report = simplify_buildings(&buildings, &BatchConfig::default())?;

    for tree in &report.trees {
        println!("building {} ({} layers)", tree.building_id(), tree.len());
        for layer in tree.layers() {
            println!(
                "  [{:>3}, {:>3})  contours={}  primitives={}  error={:.4}",
                layer.bottom_height,
                layer.top_height,
                layer.footprint.len(),
                layer.costs.primitive_count,
                layer.costs.error_ratio(),
            );
        }
    }
    for record in &report.records {
        println!(
            "{:<16} primitives={:<3} error={:.4}",
            record.algorithm, record.primitive_count, record.error_ratio
        );
    }
    println!("elapsed: {:?}", report.elapsed);
    Ok(())
}
