pub mod profile_wizard;
