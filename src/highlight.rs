//! Code sample rendering. Snippets are piped through an external highlighter
//! and its ANSI output converted to styled lines; any failure falls back to
//! plain text.

use std::collections::HashMap;
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use ansi_to_tui::IntoText;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use tracing::{debug, warn};

use crate::catalog::Topic;
use crate::config::HighlightConfig;

const LINE_NUMBER_COLOR: Color = Color::Rgb(100, 116, 139);
const MIN_GUTTER_WIDTH: usize = 2;

pub struct Highlighter {
    argv: Vec<String>,
    enabled: bool,
    line_numbers: bool,
    cache: HashMap<String, Text<'static>>,
}

impl Highlighter {
    pub fn new(config: &HighlightConfig, language: &str) -> Self {
        let argv = config.argv(language);
        if !config.enabled || argv.is_empty() {
            return Self::plain(config.line_numbers);
        }
        Self {
            argv,
            enabled: true,
            line_numbers: config.line_numbers,
            cache: HashMap::new(),
        }
    }

    pub fn plain(line_numbers: bool) -> Self {
        Self {
            argv: Vec::new(),
            enabled: false,
            line_numbers,
            cache: HashMap::new(),
        }
    }

    /// Styled code for `topic`, computed once per topic id.
    pub fn code_text(&mut self, topic: &Topic, text: Color) -> Text<'static> {
        if let Some(cached) = self.cache.get(&topic.id) {
            return cached.clone();
        }
        let style = Style::default().fg(text);
        let mut lines = if self.enabled {
            match highlight_lines(&self.argv, &topic.code) {
                Some(lines) => lines,
                None => plain_lines(&topic.code, style),
            }
        } else {
            plain_lines(&topic.code, style)
        };
        if self.line_numbers {
            lines = with_line_numbers(lines);
        }
        let rendered = Text::from(lines);
        self.cache.insert(topic.id.clone(), rendered.clone());
        rendered
    }
}

fn highlight_lines(argv: &[String], code: &str) -> Option<Vec<Line<'static>>> {
    if code.is_empty() {
        return Some(Vec::new());
    }
    let output = run_command_with_input(argv, code)?;
    match output.as_bytes().to_vec().into_text() {
        Ok(text) => Some(text.lines),
        Err(err) => {
            warn!(error = %err, "highlighter output is not valid ANSI");
            None
        }
    }
}

fn plain_lines(code: &str, style: Style) -> Vec<Line<'static>> {
    code.lines()
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

fn with_line_numbers(lines: Vec<Line<'static>>) -> Vec<Line<'static>> {
    let width = lines.len().to_string().len().max(MIN_GUTTER_WIDTH);
    let gutter = Style::default().fg(LINE_NUMBER_COLOR);
    lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            let mut spans = Vec::with_capacity(line.spans.len() + 1);
            spans.push(Span::styled(format!("{:>width$}  ", index + 1), gutter));
            spans.extend(line.spans);
            Line::from(spans).style(line.style)
        })
        .collect()
}

fn run_command_with_input(argv: &[String], input: &str) -> Option<String> {
    let (program, args) = argv.split_first()?;
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            debug!(program = %program, error = %err, "highlighter unavailable");
            return None;
        }
    };

    // Written on its own thread: a streaming child blocks on a full stdout
    // pipe until we start reading.
    let writer = child.stdin.take().map(|mut stdin| {
        let input = input.to_string();
        thread::spawn(move || stdin.write_all(input.as_bytes()))
    });

    let output = child.wait_with_output();
    if let Some(writer) = writer {
        match writer.join() {
            Ok(Err(err)) => {
                debug!(program = %program, error = %err, "failed to write snippet to highlighter")
            }
            Err(_) => debug!(program = %program, "highlighter input thread panicked"),
            Ok(Ok(())) => {}
        }
    }
    let output = output.ok()?;
    if !output.status.success() {
        debug!(program = %program, status = %output.status, "highlighter failed");
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout)
        .trim_end()
        .to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}
