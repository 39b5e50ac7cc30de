pub mod mapped_gamepad;
