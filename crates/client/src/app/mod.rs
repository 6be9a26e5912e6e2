pub(crate) mod bootstrap;
pub(crate) mod cursors;
pub(crate) mod hud;
pub(crate) mod icons;
pub(crate) mod loop_runner;
