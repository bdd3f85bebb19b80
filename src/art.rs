pub fn welcome_message(name: &str) -> String {
    let title = format!("{} v{}", name, crate::VERSION);
    let rule = "=".repeat(title.len() + 4);
    format!(
        "{rule}\n  {title}\n{rule}\nType 'help' for commands, 'exit' to quit.\n",
        rule = rule,
        title = title
    )
}
