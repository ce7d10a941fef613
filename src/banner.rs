// src/banner.rs

/// Prints the application startup banner to the console.
pub fn print_banner() {
    // Using a raw string literal for the multi-line banner
    let banner = r#"
                                                 _
  _____  ____ _ _ __ ___     __ _ _ __ __ _  __| | ___ _ __
 / _ \ \/ / _` | '_ ` _ \   / _` | '__/ _` |/ _` |/ _ \ '__|
|  __/>  < (_| | | | | | | | (_| | | | (_| | (_| |  __/ |
 \___/_/\_\__,_|_| |_| |_|  \__, |_|  \__,_|\__,_|\___|_|
                            |___/

    LLM-assisted Exam Answer Grading
"#;
    println!("{}", banner);
}
