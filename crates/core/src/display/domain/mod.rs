pub mod display_updater;
