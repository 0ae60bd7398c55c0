use std::io::Cursor;

use cube_engine::console::{Console, PROMPT};
use cube_engine::foundation::time::SharedFramerate;
use cube_engine::scene::{CloseFlag, SceneState, SharedScene, CUBE_SPECULAR_EXP};

struct Session {
    scene: SharedScene,
    framerate: SharedFramerate,
    close: CloseFlag,
}

impl Session {
    fn new() -> Self {
        Self {
            scene: SharedScene::new(SceneState::new(1024, 768)),
            framerate: SharedFramerate::new(),
            close: CloseFlag::new(),
        }
    }

    /// Feed `input` through a console and return everything it printed
    fn run(&self, input: &str) -> String {
        let mut console = Console::new(
            self.scene.clone(),
            self.framerate.clone(),
            self.close.clone(),
            Vec::new(),
        );
        console.run(Cursor::new(input.as_bytes())).unwrap();
        String::from_utf8(console.into_output()).unwrap()
    }
}

#[test]
fn set_then_read_ambient() {
    let session = Session::new();
    let out = session.run("ambient 0.2 0.3 0.4\nambient\n");

    assert!(out.contains("{ 0.200000f, 0.300000f, 0.400000f }"), "{}", out);
    assert_eq!(session.scene.lock().attributes.ambient_color[..3], [0.2, 0.3, 0.4]);
}

#[test]
fn specular_exponent_default_and_bad_argument() {
    let session = Session::new();
    let out = session.run("specularExp\nspecularExp abc\n");

    assert!(out.contains(&format!("{:.6}f", CUBE_SPECULAR_EXP)), "{}", out);
    assert!(out.contains("Invalid argument: abc"), "{}", out);
    assert_eq!(session.scene.lock().attributes.specular_exp, CUBE_SPECULAR_EXP);
}

#[test]
fn quit_raises_close_flag_and_stops_reading() {
    let session = Session::new();
    let out = session.run("quit\nambient 1 1 1\n");

    assert!(session.close.is_requested());
    // Only the prompt before `quit`; nothing after it runs
    assert_eq!(out.matches(PROMPT).count(), 1);
    assert_eq!(session.scene.lock().attributes.ambient_color[0], 0.15);
}

#[test]
fn wrong_argument_count_does_not_mutate() {
    let session = Session::new();
    let before = session.scene.lock().attributes;
    let out = session.run("lightPos 1 2\n");

    assert!(out.contains("Requires 3 argument(s)."), "{}", out);
    assert_eq!(session.scene.lock().attributes, before);
}

#[test]
fn fps_reports_shared_value() {
    let session = Session::new();
    session.framerate.set(59.5);
    let out = session.run("FPS\n");
    assert!(out.contains("FPS: 59.500000"), "{}", out);
}

#[test]
fn end_of_input_leaves_close_flag_alone() {
    let session = Session::new();
    session.run("eye 0 0 5\n");

    assert!(!session.close.is_requested());
    assert_eq!(session.scene.lock().eye().z, 5.0);
}
