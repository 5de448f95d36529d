//! Rectangle annotations: model, drawing gesture, persistence and painting

mod gesture;
mod model;
mod overlay;
mod store;

pub use gesture::{DrawTrigger, GestureContext, PointerButton, RectGesture};
pub use model::{
    CanvasPoint, PALETTE, RectAnnotation, format_color, next_palette_color, parse_color,
};
pub use overlay::{STROKE_WIDTH, paint_annotations, paint_preview};
pub use store::{
    AnnotationStore, JsonFileStore, KeyValueStore, MemoryStore, annotation_key,
    decode_annotations, encode_annotations,
};
