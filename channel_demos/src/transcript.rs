use sync_tools::{wrap, Wrapped};

/// The output lines of a demo, shared by every task taking part in it.
///
/// With `echo` set each line is also printed to stdout as soon as it is written.
#[derive(Clone, Default)]
pub struct Transcript {
    lines: Wrapped<Vec<String>>,
    echo: bool,
}

impl Transcript {
    pub fn new(echo: bool) -> Self {
        Self {
            lines: wrap!(Vec::new()),
            echo,
        }
    }

    pub async fn line(&self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            println!("{line}");
        }
        self.lines.lock().await.push(line);
    }

    pub async fn lines(&self) -> Vec<String> {
        self.lines.lock().await.clone()
    }
}
