mod annotate;
mod error;
mod output;
mod segmentation;
mod state;
mod window;

use annotate::{AnnotationController, Command, PointerTracker};
use anyhow::{Context, Result};
use clap::Parser;
use error::WhiteboardError;
use image::GrayImage;
use state::mask::Label;
use state::ImageState;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use window::Viewer;

const INSTRUCTIONS: &str = "\
Two windows open: Input (your image) and Output (the current selection).

  1. In Input, drag a rectangle around the object with the RIGHT mouse button.
  2. Press 'n' to segment, once or a few times.
  3. For touch-ups press '0' or '1' and paint with the LEFT mouse button,
     then press 'n' again. Background strokes are black, foreground white.
  4. Press 's' to show the whiteboard version and save it.

Key '0'   - mark sure background
Key '1'   - mark sure foreground
Key 'n'   - update the segmentation
Key 's'   - show and save the result
Key 'esc' - exit
";

#[derive(Parser, Debug)]
#[command(author, version, about = "Cut an object out of a photo and turn it into whiteboard line art", long_about = None)]
struct Args {
    /// Input image
    input: PathBuf,

    /// Where to write the whiteboard image (overwritten without asking)
    #[arg(short, long, default_value = output::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Brush radius in pixels for touch-up strokes
    #[arg(long, default_value_t = annotate::DEFAULT_THICKNESS, value_parser = clap::value_parser!(i32).range(1..))]
    brush_thickness: i32,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    println!("{INSTRUCTIONS}");

    let stdin = io::stdin();
    let mut state = load_with_retry(&args.input, &mut stdin.lock(), &mut io::stdout())?;

    let (width, height) = state.dimensions();
    let mut viewer = Viewer::new(width, height).context("Failed to open windows")?;
    let mut controller = AnnotationController::new(args.brush_thickness);

    tracing::info!("Editing {} ({}x{})", state.path().display(), width, height);
    tracing::info!("Output: {}", args.output.display());
    tracing::info!("Brush thickness: {}px", controller.thickness());
    tracing::info!("Draw a rectangle around the object using right mouse button");

    run_loop(&mut state, &mut controller, &mut viewer, &args.output)?;

    tracing::info!("Closing windows");
    Ok(())
}

/// Keep asking for a path until one decodes. Gives up when `input` hits EOF.
fn load_with_retry<R, W>(path: &Path, input: &mut R, prompt: &mut W) -> Result<ImageState>
where
    R: BufRead,
    W: Write,
{
    let mut path = path.to_path_buf();
    loop {
        match ImageState::load(&path) {
            Ok(state) => return Ok(state),
            Err(err) => {
                tracing::warn!("{}", err);
                write!(prompt, "\nFile does not exist!\nEnter valid filename: ")?;
                prompt.flush()?;

                let mut line = String::new();
                if input.read_line(&mut line)? == 0 {
                    return Err(err).context("No valid input image given");
                }
                path = PathBuf::from(line.trim());
            }
        }
    }
}

fn run_loop(
    state: &mut ImageState,
    controller: &mut AnnotationController,
    viewer: &mut Viewer,
    output_path: &Path,
) -> Result<()> {
    let mut tracker = PointerTracker::new();
    viewer.set_input_title(&input_title(controller.draw_label()));

    tracing::info!("Starting annotation loop");

    loop {
        viewer
            .present(state.working(), state.output())
            .context("Failed to present frame")?;
        if !viewer.is_open() {
            break;
        }

        // One key per iteration
        let command = viewer
            .typed_chars()
            .into_iter()
            .find_map(Command::from_char);

        if let Some(command) = command {
            match dispatch(command, state, controller, output_path) {
                Step::Exit => break,
                Step::ShowEdges { edges, whiteboard } => viewer
                    .show_edges(&edges, &whiteboard)
                    .context("Failed to show edge previews")?,
                Step::Continue => {}
            }
            viewer.set_input_title(&input_title(controller.draw_label()));
        }

        for event in tracker.update(viewer.pointer()) {
            controller.handle(event, state);
        }

        state.recompute_display();
    }

    Ok(())
}

/// What the loop does after a key command
enum Step {
    Continue,
    Exit,
    /// Raw and inverted edge maps to preview after a save
    ShowEdges {
        edges: GrayImage,
        whiteboard: GrayImage,
    },
}

/// Apply one key command to the session
fn dispatch(
    command: Command,
    state: &mut ImageState,
    controller: &mut AnnotationController,
    output_path: &Path,
) -> Step {
    match command {
        Command::Exit => Step::Exit,
        Command::DrawBackground => {
            controller.set_draw_label(false);
            Step::Continue
        }
        Command::DrawForeground => {
            controller.set_draw_label(true);
            Step::Continue
        }
        Command::Segment => {
            tracing::info!("Mark foreground and background and press (n) again");
            tracing::debug!("Seeding from {:?}, rectangle {:?}", state.mode(), state.rect());
            if let Err(err) = state.refine_segmentation() {
                report(&err);
            }
            Step::Continue
        }
        Command::Save => {
            let rendered = state
                .detect_edges()
                .and_then(|edges| state.render_edges().map(|whiteboard| (edges, whiteboard)));
            let (edges, whiteboard) = match rendered {
                Ok(pair) => pair,
                Err(err) => {
                    report(&err);
                    return Step::Continue;
                }
            };
            match ImageState::save(&whiteboard, output_path) {
                Ok(()) => tracing::info!("Result saved as image"),
                Err(err) => report(&err),
            }
            Step::ShowEdges { edges, whiteboard }
        }
    }
}

/// Session-level errors are reminders, never fatal.
fn report(err: &WhiteboardError) {
    match err {
        WhiteboardError::DegenerateRegion => {
            tracing::warn!("First, draw rectangle with the right mouse button")
        }
        WhiteboardError::InsufficientSamples { .. } => {
            tracing::warn!("{}", err);
            tracing::info!("Press (0) or (1) and paint with the left mouse button, then (n)");
        }
        other => tracing::warn!("{}", other),
    }
}

fn input_title(label: Label) -> String {
    match label {
        Label::Background | Label::ProbableBackground => "Input - marking background (0)".to_string(),
        Label::Foreground | Label::ProbableForeground => "Input - marking foreground (1)".to_string(),
    }
}
