pub mod forward_kinematics;
pub mod jacobian;
pub mod recursive_newton_euler;
