// ── Domain model ──
//
// Immutable webcam records handed to the resolver by the config loader.
// Shape validation happens upstream in `sunline-config`; these types make
// an invalid source shape unrepresentable.

mod webcam;

pub use webcam::{ChCoord, SourceKind, SourceUrl, Webcam, WebcamSource};
