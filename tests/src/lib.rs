
pub use mock_switch::MockSwitch;
