//
mod help_screen;
mod main_screen;

//
pub use help_screen::HelpScreen;
pub use main_screen::MainScreen;
