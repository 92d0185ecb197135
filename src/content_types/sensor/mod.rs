//! Inertial sensor data: accelerometer, gyroscope, gravity vector, magnetometer.

mod orientation;
mod sensor_field;
mod sensor_type;

pub use orientation::Orientation;
pub use sensor_field::VectorSample;
pub use sensor_type::SensorType;
