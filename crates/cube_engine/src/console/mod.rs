//! Interactive console for tweaking the lighting at runtime
//!
//! Reads one command per line, `<command> [<float> ...]`. A command given without
//! arguments prints its current value; with the exact argument count it sets it.
//! Command names are case-insensitive.
//!
//! The console runs on its own thread and only touches the scene through
//! [`SharedScene`]; quitting raises the [`CloseFlag`] for the render loop to act on.

use std::io::{self, BufRead, Write};
use std::thread::JoinHandle;

use crate::foundation::time::SharedFramerate;
use crate::scene::{CloseFlag, SceneAttributes, SharedScene};

/// Prompt printed before every line
pub const PROMPT: &str = "> ";

const BANNER: &str = "Starting interactive console. Type \"help\" for a list of commands.\n\n";

const HELP: &str = "  Arguments are floating point values.\n\
                    \x20 Specify a command without arguments to get the current value.\n\n\
                    \x20 ambient [r] [g] [b]\t\tSet the ambient color.\n\
                    \x20 diffuse [r] [g] [b]\t\tSet the diffuse color.\n\
                    \x20 specular [r] [g] [b]\t\tSet the specular color.\n\
                    \x20 specularExp [e]\t\tSet the specular exponent.\n\
                    \x20 eye [x] [y] [z]\t\tSet the eye/camera position.\n\
                    \x20 lightPos [x] [y] [z]\t\tSet the light position.\n\
                    \x20 lightColor [r] [g] [b]\tSet the light color.\n\
                    \x20 fps\t\t\t\tDisplay the current framerate.\n\
                    \x20 quit\t\t\t\tQuit the program.\n\
                    \x20 help\t\t\t\tDisplay this help.\n\n";

/// Recognized console commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ambient color
    Ambient,
    /// Diffuse color
    Diffuse,
    /// Specular color
    Specular,
    /// Specular exponent, one argument
    SpecularExp,
    /// Camera position
    Eye,
    /// Light position
    LightPos,
    /// Light color
    LightColor,
    /// Print the current framerate
    Fps,
    /// Close the window
    Quit,
    /// List the commands
    Help,
}

impl Command {
    const ALL: [Command; 10] = [
        Command::Ambient,
        Command::Diffuse,
        Command::Specular,
        Command::SpecularExp,
        Command::Eye,
        Command::LightPos,
        Command::LightColor,
        Command::Fps,
        Command::Quit,
        Command::Help,
    ];

    /// Name as typed by the user
    pub fn name(self) -> &'static str {
        match self {
            Command::Ambient => "ambient",
            Command::Diffuse => "diffuse",
            Command::Specular => "specular",
            Command::SpecularExp => "specularExp",
            Command::Eye => "eye",
            Command::LightPos => "lightPos",
            Command::LightColor => "lightColor",
            Command::Fps => "fps",
            Command::Quit => "quit",
            Command::Help => "help",
        }
    }

    /// Look up a command, ignoring ASCII case
    pub fn from_name(name: &str) -> Option<Command> {
        Self::ALL.into_iter().find(|cmd| cmd.name().eq_ignore_ascii_case(name))
    }

    /// Number of arguments a setter takes
    pub fn arity(self) -> usize {
        match self {
            Command::SpecularExp => 1,
            Command::Fps | Command::Quit | Command::Help => 0,
            _ => 3,
        }
    }

    /// The vector this command reads and writes, if it is a vector command
    fn vector(self, attributes: &mut SceneAttributes) -> Option<&mut [f32; 4]> {
        match self {
            Command::Ambient => Some(&mut attributes.ambient_color),
            Command::Diffuse => Some(&mut attributes.diffuse_color),
            Command::Specular => Some(&mut attributes.specular_color),
            Command::Eye => Some(&mut attributes.eye_pos),
            Command::LightPos => Some(&mut attributes.light_pos),
            Command::LightColor => Some(&mut attributes.light_color),
            _ => None,
        }
    }
}

/// Whether the console keeps reading after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line
    Continue,
    /// Stop reading input
    Quit,
}

/// Line interpreter bound to the shared scene
pub struct Console<W: Write> {
    scene: SharedScene,
    framerate: SharedFramerate,
    close: CloseFlag,
    out: W,
}

impl<W: Write> Console<W> {
    /// Create a console writing its responses to `out`
    pub fn new(scene: SharedScene, framerate: SharedFramerate, close: CloseFlag, out: W) -> Self {
        Self {
            scene,
            framerate,
            close,
            out,
        }
    }

    /// Prompt and execute lines from `input` until `quit` or end of input.
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        write!(self.out, "{}", BANNER)?;
        let mut lines = input.lines();
        loop {
            write!(self.out, "{}", PROMPT)?;
            self.out.flush()?;

            let Some(line) = lines.next() else {
                log::debug!("Console input closed");
                return Ok(());
            };
            if self.execute(&line?)? == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// Execute a single command line.
    pub fn execute(&mut self, line: &str) -> io::Result<Flow> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(Flow::Continue);
        };

        let mut args = Vec::new();
        for token in tokens {
            match token.parse::<f32>() {
                Ok(value) => args.push(value),
                Err(_) => {
                    write!(self.out, "Invalid argument: {}\n\n", token)?;
                    return Ok(Flow::Continue);
                }
            }
        }

        let Some(command) = Command::from_name(name) else {
            write!(
                self.out,
                "Unknown command: {}\nType \"help\" for a list of commands.\n\n",
                name
            )?;
            return Ok(Flow::Continue);
        };

        // Vector and exponent commands print their value when called bare
        if args.is_empty() && command.arity() > 0 {
            return self.print_value(command).map(|()| Flow::Continue);
        }
        if args.len() != command.arity() {
            write!(self.out, "Requires {} argument(s).\n\n", command.arity())?;
            return Ok(Flow::Continue);
        }

        match command {
            Command::Fps => write!(self.out, "FPS: {:.6}\n\n", self.framerate.get())?,
            Command::Quit => {
                log::info!("Quit requested from console");
                self.close.request();
                return Ok(Flow::Quit);
            }
            Command::Help => write!(self.out, "{}", HELP)?,
            Command::SpecularExp => self.scene.lock().attributes.specular_exp = args[0],
            _ => {
                let mut scene = self.scene.lock();
                if let Some(vector) = command.vector(&mut scene.attributes) {
                    vector[..3].copy_from_slice(&args);
                }
                log::debug!("Console set {} to {:?}", command.name(), args);
            }
        }
        Ok(Flow::Continue)
    }

    fn print_value(&mut self, command: Command) -> io::Result<()> {
        let mut scene = self.scene.lock();
        if command == Command::SpecularExp {
            let exp = scene.attributes.specular_exp;
            drop(scene);
            return write!(self.out, "{:.6}f\n\n", exp);
        }
        let v = command.vector(&mut scene.attributes).map(|v| *v).unwrap_or_default();
        drop(scene);
        write!(self.out, "{{ {:.6}f, {:.6}f, {:.6}f }}\n\n", v[0], v[1], v[2])
    }

    /// Consume the console and return its output sink
    pub fn into_output(self) -> W {
        self.out
    }
}

/// Run the console on stdin/stdout in a background thread.
///
/// The thread is never joined by the render loop; it may stay blocked on stdin
/// until the process exits.
pub fn spawn(scene: SharedScene, framerate: SharedFramerate, close: CloseFlag) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            let mut console = Console::new(scene, framerate, close, io::stdout());
            if let Err(e) = console.run(io::stdin().lock()) {
                log::error!("Console stopped: {}", e);
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneState;

    fn console() -> Console<Vec<u8>> {
        Console::new(
            SharedScene::new(SceneState::new(1024, 768)),
            SharedFramerate::new(),
            CloseFlag::new(),
            Vec::new(),
        )
    }

    fn output(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_output()).unwrap()
    }

    #[test]
    fn test_command_lookup_ignores_case() {
        assert_eq!(Command::from_name("AMBIENT"), Some(Command::Ambient));
        assert_eq!(Command::from_name("specularexp"), Some(Command::SpecularExp));
        assert_eq!(Command::from_name("LightColor"), Some(Command::LightColor));
        assert_eq!(Command::from_name("light"), None);
    }

    #[test]
    fn test_blank_line_is_ignored() {
        let mut c = console();
        assert_eq!(c.execute("   ").unwrap(), Flow::Continue);
        assert_eq!(output(c), "");
    }

    #[test]
    fn test_wrong_arity() {
        let mut c = console();
        c.execute("diffuse 1 2").unwrap();
        c.execute("specularExp 1 2 3").unwrap();
        assert_eq!(c.execute("quit now").unwrap(), Flow::Continue);
        assert_eq!(
            output(c),
            "Requires 3 argument(s).\n\nRequires 1 argument(s).\n\nInvalid argument: now\n\n"
        );
    }

    #[test]
    fn test_fps_reads_shared_value() {
        let mut c = console();
        c.framerate.set(60.0);
        c.execute("fps").unwrap();
        assert_eq!(output(c), "FPS: 60.000000\n\n");
    }

    #[test]
    fn test_help_lists_every_command() {
        let mut c = console();
        c.execute("help").unwrap();
        let text = output(c);
        for command in Command::ALL {
            assert!(text.contains(&format!("  {}", command.name())), "{}", command.name());
        }
    }
}
