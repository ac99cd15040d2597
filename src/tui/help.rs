//! Help overlay — keybinding reference.

/// A line in the help overlay.
#[derive(Debug, Clone)]
pub struct HelpLine {
    pub text: String,
    pub is_header: bool,
}

/// Help overlay state.
#[derive(Debug, Clone)]
pub struct HelpScreen {
    pub visible: bool,
    content: Vec<HelpLine>,
}

impl HelpScreen {
    pub fn new() -> Self {
        Self {
            visible: false,
            content: Self::build_content(),
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn lines(&self) -> &[HelpLine] {
        &self.content
    }

    fn build_content() -> Vec<HelpLine> {
        let h = |text: &str| HelpLine {
            text: text.to_string(),
            is_header: true,
        };
        let l = |text: &str| HelpLine {
            text: text.to_string(),
            is_header: false,
        };

        vec![
            h("Drone"),
            l("  Space        Start/stop the drone"),
            l("  Left/Right   Previous/next note (follows direction)"),
            l("  s            Switch tonal series"),
            l("  d            Flip stepping direction"),
            l("  i            Switch timbre (strings/beep)"),
            l(""),
            h("Metronome"),
            l("  m            Start/stop the metronome"),
            l("  l            Link/unlink metronome and drone"),
            l("  Up/Down      Tempo +1/-1 BPM"),
            l("  PgUp/PgDn    Double/halve the tempo"),
            l(""),
            h("Levels"),
            l("  [ / ]        Volume down/up"),
            l("  { / }        Velocity down/up"),
            l(""),
            h("Session"),
            l("  r            Reset saved settings"),
            l("  ?            Toggle this help"),
            l("  q, Ctrl-C    Quit"),
        ]
    }
}

impl Default for HelpScreen {
    fn default() -> Self {
        Self::new()
    }
}
