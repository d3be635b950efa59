use std::fmt::Write as _;
use std::path::PathBuf;

use crate::report::domain::analysis_report::AnalysisReport;
use crate::report::domain::report_renderer::{RenderError, ReportRenderer};
use crate::shared::emotion::Emotion;
use crate::video::domain::image_writer::ImageWriter;

/// Longest side of exemplar images embedded in the report.
const EXEMPLAR_MAX_SIDE: u32 = 480;

/// Writes `<name>.tex` into `output_dir`, with each exemplar frame saved as
/// `<name>_<emotion>.png` next to it. Compiling the document is left to
/// `pdflatex`.
pub struct LatexReportRenderer {
    output_dir: PathBuf,
    image_writer: Box<dyn ImageWriter>,
}

impl LatexReportRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, image_writer: Box<dyn ImageWriter>) -> Self {
        Self {
            output_dir: output_dir.into(),
            image_writer,
        }
    }

    pub fn tex_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.tex", file_stem(name)))
    }

    /// Saves exemplar frames and returns the file names that were written.
    /// A frame that fails to save is left out of the report.
    fn write_exemplars(&self, report: &AnalysisReport<'_>) -> Vec<(Emotion, f32, String)> {
        let mut written = Vec::new();
        for (emotion, confidence, frame) in report.exemplars() {
            let file_name = format!("{}_{}.png", file_stem(&report.name), emotion);
            let path = self.output_dir.join(&file_name);
            match self
                .image_writer
                .write(&path, frame, Some(EXEMPLAR_MAX_SIDE))
            {
                Ok(()) => written.push((emotion, confidence, file_name)),
                Err(e) => log::warn!("Skipping {emotion} exemplar, {}: {e}", path.display()),
            }
        }
        written
    }
}

impl ReportRenderer for LatexReportRenderer {
    fn render(&self, report: &AnalysisReport<'_>) -> Result<(), RenderError> {
        let path = self.tex_path(&report.name);
        let write_err = |source: std::io::Error| RenderError::Write {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.output_dir).map_err(write_err)?;
        let exemplars = self.write_exemplars(report);
        std::fs::write(&path, document(report, &exemplars)).map_err(write_err)?;
        log::info!("LaTeX report written to {}", path.display());
        Ok(())
    }
}

fn document(report: &AnalysisReport<'_>, exemplars: &[(Emotion, f32, String)]) -> String {
    let mut tex = String::new();
    tex.push_str("\\documentclass{article}\n");
    tex.push_str("\\usepackage[tmargin=1cm,lmargin=1cm]{geometry}\n");
    tex.push_str("\\usepackage{graphicx}\n");
    tex.push_str("\\usepackage{pgfplots}\n");
    tex.push_str("\\pgfplotsset{compat=1.16}\n");
    tex.push_str("\\begin{document}\n\n");

    tex.push_str("\\section{Emotions recorded}\n");
    tex.push_str("Emotions encountered on the video (from the most to the least frequent):\n");
    tex.push_str("\\begin{itemize}\n");
    for (emotion, pct) in report.percentages.sorted() {
        let _ = writeln!(
            tex,
            "  \\item Emotion ``{emotion}'' was present on {pct:.2}\\% of labeled frames."
        );
    }
    tex.push_str("\\end{itemize}\n\n");

    tex.push_str("\\section{Looked away occurrences}\n");
    let _ = writeln!(
        tex,
        "Person looked away {} times, which is {:.2}\\% of the time.\n",
        report.looked_away_frames(),
        report.percentages.looked_away()
    );

    tex.push_str("\\section{Key takeaways}\n");
    tex.push_str("These are the main takeaways from the given parameters:\n");
    tex.push_str("\\begin{itemize}\n");
    for takeaway in &report.takeaways {
        let _ = writeln!(tex, "  \\item {}", escape(takeaway));
    }
    tex.push_str("\\end{itemize}\n\n");

    tex.push_str("\\section{Graphical appearance}\n");
    tex.push_str("There are the following marks for each emotion:\n");
    tex.push_str("\\begin{itemize}\n");
    for emotion in Emotion::ALL {
        let _ = writeln!(
            tex,
            "  \\item Emotion ``{emotion}'' level: {}.",
            emotion.valence()
        );
    }
    tex.push_str("\\end{itemize}\n");
    tex.push_str("Below, emotional shifts are plotted against the frame index.\n\n");
    tex.push_str(&plot(report.coordinates()));

    if !exemplars.is_empty() {
        tex.push_str("\n\\section{Exemplar frames}\n");
        for (emotion, confidence, file) in exemplars {
            tex.push_str("\\begin{figure}[h]\n\\centering\n");
            let _ = writeln!(tex, "\\includegraphics[width=0.5\\textwidth]{{{file}}}");
            let _ = writeln!(
                tex,
                "\\caption{{Peak ``{emotion}'' frame ({confidence:.1}\\% confidence)}}"
            );
            tex.push_str("\\end{figure}\n");
        }
    }

    tex.push_str("\n\\end{document}\n");
    tex
}

fn plot(coordinates: &[(usize, f64)]) -> String {
    let mut tex = String::new();
    tex.push_str("\\begin{tikzpicture}\n");
    tex.push_str("\\begin{axis}[height=25cm, width=20cm, xlabel={frame}, ylabel={valence}]\n");
    tex.push_str("\\addplot coordinates {");
    for (index, valence) in coordinates {
        let _ = write!(tex, " ({index},{valence})");
    }
    tex.push_str(" };\n");
    tex.push_str("\\end{axis}\n\\end{tikzpicture}\n");
    tex
}

/// File-name stem safe for `\includegraphics`: ASCII alphanumerics, `-`
/// and `_` are kept, everything else becomes `_`.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "report".to_string()
    } else {
        stem
    }
}

/// Escapes LaTeX special characters in free text.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::emotion_tally::EmotionTally;
    use crate::analysis::domain::global_result::GlobalResult;
    use crate::shared::frame::Frame;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct RecordingImageWriter {
        written: Arc<Mutex<Vec<PathBuf>>>,
        fail: bool,
    }

    impl ImageWriter for RecordingImageWriter {
        fn write(
            &self,
            path: &Path,
            _frame: &Frame,
            max_side: Option<u32>,
        ) -> Result<(), Box<dyn std::error::Error>> {
            assert_eq!(max_side, Some(EXEMPLAR_MAX_SIDE));
            if self.fail {
                return Err("disk full".into());
            }
            self.written.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    // --- Helpers ---

    fn result() -> GlobalResult {
        let mut tally = EmotionTally::default();
        tally.emotion_counts[Emotion::Happy] = 2;
        tally.emotion_counts[Emotion::Sad] = 2;
        tally.looked_away = 1;
        tally.coordinates = vec![(0, 1.0), (1, -0.5), (3, 1.0), (4, -0.5)];
        tally.best_confidence[Emotion::Happy] = 91.5;
        tally.best_frames[Emotion::Happy] = Some(Frame::new(vec![0; 2 * 2 * 3], 2, 2, 3, 3));
        GlobalResult::new(tally, 5)
    }

    fn renderer(dir: &Path, fail: bool) -> (LatexReportRenderer, Arc<Mutex<Vec<PathBuf>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let writer = RecordingImageWriter {
            written: written.clone(),
            fail,
        };
        (LatexReportRenderer::new(dir, Box::new(writer)), written)
    }

    // --- Tests ---

    #[test]
    fn test_writes_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        let (r, _) = renderer(dir.path(), false);
        let result = result();
        r.render(&AnalysisReport::new("clip", &result)).unwrap();

        let tex = std::fs::read_to_string(dir.path().join("clip.tex")).unwrap();
        for section in [
            "\\section{Emotions recorded}",
            "\\section{Looked away occurrences}",
            "\\section{Key takeaways}",
            "\\section{Graphical appearance}",
        ] {
            assert!(tex.contains(section), "missing {section}");
        }
        assert!(tex.contains("50.00\\% of labeled frames"));
        assert!(tex.contains("20.00\\% of the time"));
        assert!(tex.contains("\\addplot coordinates { (0,1) (1,-0.5) (3,1) (4,-0.5) };"));
        assert!(tex.trim_end().ends_with("\\end{document}"));
    }

    #[test]
    fn test_exemplars_saved_and_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let (r, written) = renderer(dir.path(), false);
        let result = result();
        r.render(&AnalysisReport::new("clip", &result)).unwrap();

        assert_eq!(*written.lock().unwrap(), vec![dir.path().join("clip_happy.png")]);
        let tex = std::fs::read_to_string(dir.path().join("clip.tex")).unwrap();
        assert!(tex.contains("\\includegraphics[width=0.5\\textwidth]{clip_happy.png}"));
        assert!(tex.contains("91.5\\% confidence"));
    }

    #[test]
    fn test_failed_exemplar_is_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let (r, _) = renderer(dir.path(), true);
        let result = result();
        r.render(&AnalysisReport::new("clip", &result)).unwrap();

        let tex = std::fs::read_to_string(dir.path().join("clip.tex")).unwrap();
        assert!(!tex.contains("\\section{Exemplar frames}"));
    }

    #[test]
    fn test_unwritable_directory_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let (r, _) = renderer(&blocker.join("reports"), false);
        let result = result();

        let err = r.render(&AnalysisReport::new("clip", &result)).unwrap_err();
        assert!(matches!(err, RenderError::Write { .. }));
    }

    #[test]
    fn test_names_with_special_characters_give_safe_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let (r, written) = renderer(dir.path(), false);
        let result = result();
        r.render(&AnalysisReport::new("my clip #1 (50%)", &result)).unwrap();

        assert_eq!(
            *written.lock().unwrap(),
            vec![dir.path().join("my_clip__1__50___happy.png")]
        );
        let tex = std::fs::read_to_string(dir.path().join("my_clip__1__50__.tex")).unwrap();
        assert!(tex.contains("\\includegraphics[width=0.5\\textwidth]{my_clip__1__50___happy.png}"));
    }

    #[test]
    fn test_file_stem_keeps_plain_names() {
        assert_eq!(file_stem("interview-02_take"), "interview-02_take");
        assert_eq!(file_stem("café"), "caf_");
        assert_eq!(file_stem(""), "report");
    }

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape("50% & 3_4"), "50\\% \\& 3\\_4");
        assert_eq!(escape("plain text."), "plain text.");
    }
}
