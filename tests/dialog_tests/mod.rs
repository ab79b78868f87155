mod activity_trigger_test;
mod child_dialog_test;
mod error_test;
mod input_test;
mod interruption_test;
mod memory_action_test;
mod persistence_test;
