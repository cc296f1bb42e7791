pub mod axis;
pub mod profile3d;

pub use axis::{AxisLimits, AxisProfile, AxisState, SwitchPoint};
pub use profile3d::Trajectory3D;
