// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Colored status lines for the CLI.

use colored::Colorize;

/// Print a green success line.
pub fn success(message: &str) {
    println!("{}", format!("SUCCESS : {}", message).bright_green());
}

/// Print a yellow warning line.
pub fn warning(message: &str) {
    println!("{}", format!("WARNING : {}", message).bright_yellow());
}

/// Print a red error line to stderr.
pub fn error(message: &str) {
    eprintln!("{}", format!("ERROR : {}", message).bright_red());
}
