//! Real-ESRGAN super-resolution via the `realesrgan-ncnn-vulkan` binary.
//!
//! The image is handed over as a lossless PNG in a scratch directory and the
//! upscaled PNG is read back from the same directory. The scratch directory
//! is removed when the call returns, whatever the outcome.
//!
//! The binary is run with its own directory as the working directory so the
//! `models/` folder bundled next to it resolves. Invocation:
//!
//! ```text
//! realesrgan-ncnn-vulkan -i <in.png> -o <out.png> -s <scale> -n <model> -f png
//! ```
//!
//! Every failure mode (binary missing, non-zero exit, no output file, timeout)
//! surfaces as an [`ImagingError`] and fails only the current image.

use super::backend::{ImagingError, SuperResolver};
use super::codec::{load_asset, save_asset};
use crate::types::Asset;
use image::RgbaImage;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const DEFAULT_BINARY: &str = "realesrgan-ncnn-vulkan";
pub const DEFAULT_MODEL: &str = "realesrgan-x4plus";

/// Bound on the `-h` availability probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, PartialEq)]
pub struct RealEsrganSettings {
    /// Executable name looked up on `PATH`, or an explicit path.
    pub binary: String,
    pub model: String,
    pub scale: u32,
    pub timeout: Duration,
}

impl Default for RealEsrganSettings {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            model: DEFAULT_MODEL.to_string(),
            scale: 4,
            timeout: Duration::from_secs(300),
        }
    }
}

/// External-process [`SuperResolver`].
#[derive(Debug, Clone, Default)]
pub struct RealEsrgan {
    settings: RealEsrganSettings,
}

/// Exit status plus captured output of a finished tool run.
#[derive(Debug)]
struct ToolOutput {
    status: ExitStatus,
    stderr: String,
}

impl RealEsrgan {
    pub fn new(settings: RealEsrganSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RealEsrganSettings {
        &self.settings
    }

    /// Locate the binary: explicit paths are taken as is, bare names are
    /// searched on `PATH`.
    pub fn resolve_binary(&self) -> Result<PathBuf, ImagingError> {
        let configured = Path::new(&self.settings.binary);
        if configured.components().count() > 1 || configured.is_absolute() {
            return if configured.is_file() {
                Ok(configured.to_path_buf())
            } else {
                Err(ImagingError::ExternalTool(format!(
                    "super-resolution binary not found at {}",
                    configured.display()
                )))
            };
        }
        which::which(&self.settings.binary).map_err(|_| {
            ImagingError::ExternalTool(format!(
                "super-resolution binary '{}' not found on PATH",
                self.settings.binary
            ))
        })
    }

    /// Run `<binary> -h` and report whether the tool is usable.
    ///
    /// Exit codes 0 and 1 both count as available: the tool prints its usage
    /// and exits 1 when given `-h`.
    pub fn check_available(&self) -> Result<PathBuf, ImagingError> {
        let binary = self.resolve_binary()?;
        let mut command = Command::new(&binary);
        command.arg("-h");
        let output = run_with_timeout(command_in_binary_dir(command, &binary), PROBE_TIMEOUT)?;
        match output.status.code() {
            Some(0) | Some(1) => Ok(binary),
            code => Err(ImagingError::ExternalTool(format!(
                "{} -h exited with {}",
                binary.display(),
                describe_code(code)
            ))),
        }
    }
}

impl SuperResolver for RealEsrgan {
    fn enhance(&self, image: &RgbaImage, factor: u32) -> Result<RgbaImage, ImagingError> {
        let binary = self.resolve_binary()?;
        let scratch = TempDir::new()?;
        let input = scratch.path().join("input.png");
        let output = scratch.path().join("output.png");
        save_asset(&Asset::new(image.clone()), &input)?;

        let mut command = Command::new(&binary);
        command
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .arg("-s")
            .arg(factor.to_string())
            .arg("-n")
            .arg(&self.settings.model)
            .arg("-f")
            .arg("png");

        log::debug!(
            "running {} (x{factor}, model {})",
            binary.display(),
            self.settings.model
        );
        let started = Instant::now();
        let result = run_with_timeout(
            command_in_binary_dir(command, &binary),
            self.settings.timeout,
        )?;

        if !result.status.success() {
            return Err(ImagingError::ExternalTool(format!(
                "{} exited with {}: {}",
                binary.display(),
                describe_code(result.status.code()),
                result.stderr.trim()
            )));
        }
        if !output.is_file() {
            return Err(ImagingError::ExternalTool(format!(
                "{} exited successfully but wrote no output image",
                binary.display()
            )));
        }

        let upscaled = load_asset(&output)?.pixels;
        log::debug!(
            "super-resolution {}x{} → {}x{} in {:.1}s",
            image.width(),
            image.height(),
            upscaled.width(),
            upscaled.height(),
            started.elapsed().as_secs_f32()
        );
        Ok(upscaled)
    }
}

fn command_in_binary_dir(mut command: Command, binary: &Path) -> Command {
    if let Some(dir) = binary.parent().filter(|d| !d.as_os_str().is_empty()) {
        command.current_dir(dir);
    }
    command
}

fn describe_code(code: Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}"))
}

/// Spawn `command`, capture its output, and kill it if it outlives `limit`.
fn run_with_timeout(mut command: Command, limit: Duration) -> Result<ToolOutput, ImagingError> {
    let program = command.get_program().to_string_lossy().to_string();
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ImagingError::ExternalTool(format!("failed to start {program}: {e}")))?;

    // Drain both pipes so a chatty tool cannot block on a full buffer
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= limit {
            kill(&mut child);
            return Err(ImagingError::Timeout {
                tool: program,
                limit,
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let _ = stdout.join();
    let stderr = stderr.join().unwrap_or_default();
    Ok(ToolOutput { status, stderr })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut pipe) = pipe {
            let mut bytes = Vec::new();
            let _ = pipe.read_to_end(&mut bytes);
            text = String::from_utf8_lossy(&bytes).into_owned();
        }
        text
    })
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::warn!("failed to kill timed-out process: {e}");
    }
    let _ = child.wait();
}
