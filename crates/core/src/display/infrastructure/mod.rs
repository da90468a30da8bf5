pub mod process_info;
pub mod update_display_process;
