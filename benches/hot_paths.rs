use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::DVec2;
use globescan::raster::{PixelBuffer, ScanlineRenderer};
use globescan::vector::{RectClipper, ScreenPolygon, VectorProjector};
use globescan::{Projection, TileBuffer, TileCache, TileError, TileId, TileSource, Viewport};

struct SyntheticSource;

impl TileSource for SyntheticSource {
    fn tile_width(&self) -> usize {
        256
    }
    fn tile_height(&self) -> usize {
        256
    }
    fn max_level(&self) -> u32 {
        6
    }
    fn load(&self, id: TileId) -> Result<TileBuffer, TileError> {
        let mut pixels = vec![0u32; 256 * 256];
        for (i, px) in pixels.iter_mut().enumerate() {
            *px = 0xff00_0000 | ((id.column + id.row) << 16) | (i as u32 & 0xffff);
        }
        Ok(TileBuffer::new(256, 256, pixels))
    }
}

fn bench_map_texture(c: &mut Criterion) {
    let renderer = ScanlineRenderer::new(800, 600);
    let mut target = PixelBuffer::new(800, 600);
    let mut cache = TileCache::new(SyntheticSource);

    let globe = Viewport::new(Projection::Spherical, 0.5, 0.7, 280, 800, 600);
    c.bench_function("map_texture_spherical", |b| {
        b.iter(|| renderer.map_texture(black_box(&mut target), &globe, &mut cache))
    });

    let flat = Viewport::new(Projection::Equirectangular, 0.5, 0.7, 280, 800, 600);
    c.bench_function("map_texture_flat", |b| {
        b.iter(|| renderer.map_texture(black_box(&mut target), &flat, &mut cache))
    });
}

fn bench_vector_pipeline(c: &mut Criterion) {
    // A dense ring weaving on and off the visible hemisphere.
    let ring: Vec<(f64, f64)> = (0..4096)
        .map(|i| {
            let t = i as f64 / 4096.0 * std::f64::consts::TAU;
            (t - std::f64::consts::PI, 0.9 * (3.0 * t).sin())
        })
        .collect();

    let projector = VectorProjector::new(800, 600);
    let viewport = Viewport::new(Projection::Spherical, 0.0, 0.0, 280, 800, 600);
    let mat = viewport.orientation.inverse().to_matrix();
    c.bench_function("project_spherical_ring", |b| {
        b.iter(|| {
            projector.project_path(
                black_box(ring.iter().copied()),
                true,
                &viewport,
                &mat,
            )
        })
    });

    let clipper = RectClipper::new(800, 600);
    let screen_ring = ScreenPolygon::ring(
        (0..4096)
            .map(|i| {
                let t = i as f64 / 4096.0 * std::f64::consts::TAU;
                DVec2::new(400.0 + 500.0 * t.cos(), 300.0 + 500.0 * t.sin())
            })
            .collect(),
    );
    c.bench_function("rect_clip_ring", |b| {
        b.iter(|| clipper.clip(black_box(&screen_ring)))
    });
}

criterion_group!(benches, bench_map_texture, bench_vector_pipeline);
criterion_main!(benches);
