use colored::Colorize;

pub fn show() {
    let version = env!("CARGO_PKG_VERSION");
    let name = env!("CARGO_PKG_NAME");

    println!("{} v{}", name.bright_green(), version.bright_white());
    println!("Platform: {}", plan_check::utils::current_platform_key().bright_blue());
}
