//! Frame composition: fixed layer order over one viewport.
//!
//! Background fill, then the raster pass, then boundary vectors, then
//! the graticule. The order is a structural contract of the pipeline,
//! not a runtime option; toggles only remove layers, never reorder
//! them.

use tracing::debug;

use crate::graticule;
use crate::projection::{Projection, Viewport};
use crate::raster::{PixelBuffer, ScanlineRenderer};
use crate::tile::{TileCache, TileSource};
use crate::vector::{GeoBoundary, RectClipper, ScreenPolygon, VectorProjector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Boundary,
    Graticule,
}

/// One vector layer of a composed frame, ready for a drawing backend.
#[derive(Debug, Clone)]
pub struct VectorLayer {
    pub kind: LayerKind,
    pub polygons: Vec<ScreenPolygon>,
}

/// A fully composed frame: the filled raster plus the vector layers in
/// draw order.
pub struct Frame {
    pub raster: PixelBuffer,
    pub layers: Vec<VectorLayer>,
}

#[derive(Debug, Clone, Copy)]
pub struct FrameOptions {
    pub show_raster: bool,
    pub show_boundaries: bool,
    pub show_grid: bool,
    pub show_tropics: bool,
    pub show_equator: bool,
    /// Render every second scanline during interaction.
    pub interlaced: bool,
    pub background: u32,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            show_raster: true,
            show_boundaries: true,
            show_grid: true,
            show_tropics: true,
            show_equator: true,
            interlaced: false,
            background: 0xff00_0000,
        }
    }
}

pub struct Composer {
    width: usize,
    height: usize,
    renderer: ScanlineRenderer,
    projector: VectorProjector,
    clipper: RectClipper,
}

impl Composer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            renderer: ScanlineRenderer::new(width, height),
            projector: VectorProjector::new(width, height),
            clipper: RectClipper::new(width, height),
        }
    }

    /// Composes one frame. The viewport's dimensions must match the
    /// composer's canvas.
    pub fn compose<S: TileSource>(
        &mut self,
        viewport: &Viewport,
        cache: &mut TileCache<S>,
        boundaries: &[GeoBoundary],
        options: &FrameOptions,
    ) -> Frame {
        debug_assert_eq!((viewport.width, viewport.height), (self.width, self.height));

        let mut raster = PixelBuffer::new(self.width, self.height);
        raster.clear(options.background);
        if options.show_raster {
            self.renderer.interlaced = options.interlaced;
            self.renderer.map_texture(&mut raster, viewport, cache);
        }

        // On the globe the rect clip only pays off once the disk spills
        // past the screen; the flat strips always need it.
        let clip_needed = match viewport.projection {
            Projection::Spherical => viewport.projection.covers_viewport(viewport),
            _ => true,
        };

        let mut layers = Vec::new();
        if options.show_boundaries {
            let polygons = self.projector.project(boundaries, viewport);
            layers.push(VectorLayer {
                kind: LayerKind::Boundary,
                polygons: self.clip_layer(polygons, clip_needed),
            });
        }

        let mut grid_lines = Vec::new();
        if options.show_grid {
            grid_lines.extend(graticule::grid(viewport));
        }
        if options.show_tropics {
            grid_lines.extend(graticule::tropics(viewport));
        }
        if options.show_equator {
            grid_lines.extend(graticule::equator(viewport));
        }
        if !grid_lines.is_empty() {
            layers.push(VectorLayer {
                kind: LayerKind::Graticule,
                polygons: self.clip_layer(grid_lines, clip_needed),
            });
        }

        debug!(
            layers = layers.len(),
            polygons = layers.iter().map(|l| l.polygons.len()).sum::<usize>(),
            "composed frame"
        );
        Frame { raster, layers }
    }

    fn clip_layer(&self, polygons: Vec<ScreenPolygon>, clip_needed: bool) -> Vec<ScreenPolygon> {
        if !clip_needed {
            return polygons;
        }
        polygons
            .iter()
            .flat_map(|p| self.clipper.clip(p))
            .collect()
    }
}
