// Terminal launcher: opens a new terminal window with an environment activated

use crate::error::VenvError;
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Terminal emulators tried on Unix-like systems, in order of preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminal {
    /// `gnome-terminal -- <cmd>`
    Gnome,
    /// `xterm -e <cmd>`
    Xterm,
    /// `cmd.exe` through `start`
    WindowsCmd,
}

/// A fully built terminal invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct TerminalCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Passed verbatim on Windows so cmd sees the quoting it expects
    pub raw_arg: Option<String>,
}

/// Picks the terminal to use on this machine.
pub fn detect_terminal() -> Result<Terminal, VenvError> {
    if cfg!(windows) {
        return Ok(Terminal::WindowsCmd);
    }
    if which::which("gnome-terminal").is_ok() {
        Ok(Terminal::Gnome)
    } else if which::which("xterm").is_ok() {
        Ok(Terminal::Xterm)
    } else {
        Err(VenvError::NoTerminal)
    }
}

/// Single-quote a string for bash.
fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Builds the invocation that sources `activate` in a new window and,
/// when `main_file` is given, runs it with the environment's interpreter.
pub fn build_command(
    terminal: Terminal,
    env_name: &str,
    activate: &Path,
    main_file: Option<&Path>,
) -> TerminalCommand {
    match terminal {
        Terminal::WindowsCmd => {
            let mut inner = format!(
                "{} && echo Virtual environment '{}' activated.",
                activate.display(),
                env_name
            );
            match main_file {
                Some(main) => inner.push_str(&format!(" && python \"{}\"", main.display())),
                None => inner.push_str(" Type 'deactivate' to exit."),
            }
            TerminalCommand {
                program: "cmd".to_string(),
                args: vec!["/C".to_string()],
                raw_arg: Some(format!("start cmd.exe /K \"{}\"", inner)),
            }
        }
        Terminal::Gnome | Terminal::Xterm => {
            let mut script = format!("source {}; ", shell_escape(&activate.display().to_string()));
            match main_file {
                Some(main) => {
                    script.push_str(&format!(
                        "echo {}; python {}; ",
                        shell_escape(&format!("Virtual environment '{}' activated.", env_name)),
                        shell_escape(&main.display().to_string())
                    ));
                }
                None => {
                    script.push_str(&format!(
                        "echo {}; ",
                        shell_escape(&format!(
                            "Virtual environment '{}' activated. Type 'deactivate' to exit.",
                            env_name
                        ))
                    ));
                }
            }
            script.push_str("exec bash");

            let (program, flag) = if terminal == Terminal::Gnome {
                ("gnome-terminal", "--")
            } else {
                ("xterm", "-e")
            };
            TerminalCommand {
                program: program.to_string(),
                args: vec![
                    flag.to_string(),
                    "bash".to_string(),
                    "-c".to_string(),
                    script,
                ],
                raw_arg: None,
            }
        }
    }
}

/// Starts the terminal process. The caller decides whether to wait on it.
pub fn launch(cmd: &TerminalCommand) -> Result<Child, VenvError> {
    let mut command = Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    if let Some(raw) = &cmd.raw_arg {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.raw_arg(raw);
        }
        #[cfg(not(windows))]
        command.arg(raw);
    }

    log::info!("launching terminal: {} {:?}", cmd.program, cmd.args);
    command.spawn().map_err(|source| VenvError::Spawn {
        program: cmd.program.clone(),
        source,
    })
}
