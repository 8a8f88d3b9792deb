//! # tiled-composite
//!
//! Layered image composition rendered lazily, tile by tile.
//!
//! A composition is an ordered list of resolution-independent sources
//! ([`Filter`]s), bottom to top, combined under a [`CompositeRule`]:
//!
//! - OVER, IN, OUT, ATOP and XOR (Porter-Duff)
//! - ARITHMETIC (`k1*S*D + k2*S + k3*D + k4`)
//!
//! ## Architecture
//!
//! Rendering goes through two stages:
//!
//! 1. **[`CompositionNode`]**: renders every source under a
//!    [`RenderContext`], caches and converts the results to the working
//!    color space, and applies the rule's blank-source policy and bounds
//!    algebra. On a compatible [`Surface`] it can instead draw the sources
//!    directly.
//! 2. **[`TiledCompositeRaster`]**: fixes the result layout and tile grid
//!    at construction, then composites pixels on demand for any tile or
//!    rectangle. It is immutable and can be shared across threads.
//!
//! ```
//! use std::sync::Arc;
//! use tiled_composite::{
//!     ColorWorkingSpace, CompositeRule, CompositionNode, Filter, FloodFilter, Raster,
//!     RectD, RenderContext, Rgba,
//! };
//!
//! let red: Arc<dyn Filter> = Arc::new(FloodFilter::new(
//!     RectD::new(0.0, 0.0, 4.0, 4.0),
//!     Rgba::new(1.0, 0.0, 0.0, 1.0),
//! ));
//! let blue: Arc<dyn Filter> = Arc::new(FloodFilter::new(
//!     RectD::new(0.0, 0.0, 4.0, 4.0),
//!     Rgba::new(0.0, 0.0, 1.0, 1.0),
//! ));
//! let node = CompositionNode::new(
//!     vec![red, blue],
//!     CompositeRule::Over,
//!     ColorWorkingSpace::LinearRgb,
//! );
//! let raster = node
//!     .create_rendering(&RenderContext::default())
//!     .unwrap()
//!     .unwrap();
//! let pixels = raster.get_data(raster.bounds());
//! assert_eq!(pixels.pixel(0, 0), &[0, 0, 255, 255]);
//! ```

// Foundation types
pub mod basics;
pub mod color;
pub mod error;
pub mod gamma;
pub mod trans_affine;

// Pixel storage and layouts
pub mod pixel_layout;
pub mod rendering_buffer;

// Blending
pub mod comp_op;
pub mod composite_rule;

// Rasters
pub mod color_space;
pub mod composite_raster;
pub mod pad_raster;
pub mod raster;

// Filters and surfaces
pub mod composition_node;
pub mod filter;
pub mod surface;

pub use basics::{RectD, RectI};
pub use color::{Rgba, Rgba8};
pub use color_space::ColorWorkingSpace;
pub use comp_op::CompOp;
pub use composite_raster::TiledCompositeRaster;
pub use composite_rule::{BlankSourcePolicy, CompositeRule, OperatorContext};
pub use composition_node::CompositionNode;
pub use error::{CompositeError, Result};
pub use filter::{
    Filter, FilterSources, FloodFilter, Interpolation, RasterFilter, RenderContext, RenderHints,
    RenderQuality,
};
pub use pad_raster::{PadMode, PadRaster};
pub use pixel_layout::{ColorLayout, ColorSpace, SampleLayout};
pub use raster::{BufferRaster, CachedRaster, FloodRaster, Raster, TiledRaster, TILE_PERIOD};
pub use rendering_buffer::PixelBuffer;
pub use surface::{PixelSurface, Surface};
pub use trans_affine::TransAffine;
