use anyhow::{Result, bail};

/// One user action, parsed from a line of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Capture,
    Retake,
    Save,
    Delete(usize),
    Download(usize),
    Gallery,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let verb = match words.next() {
            Some(verb) => verb.to_ascii_lowercase(),
            None => bail!("Empty command"),
        };

        let command = match verb.as_str() {
            "capture" | "c" => Self::Capture,
            "retake" | "r" => Self::Retake,
            "save" | "s" => Self::Save,
            "delete" | "d" => Self::Delete(parse_index(words.next())?),
            "download" | "dl" => Self::Download(parse_index(words.next())?),
            "gallery" | "g" | "list" => Self::Gallery,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => bail!("Unknown command: {}", other),
        };

        if words.next().is_some() {
            bail!("Trailing input after command");
        }
        Ok(command)
    }
}

fn parse_index(word: Option<&str>) -> Result<usize> {
    match word {
        Some(word) => word
            .parse()
            .map_err(|_| anyhow::anyhow!("Not a gallery index: {}", word)),
        None => bail!("Missing gallery index"),
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  capture  (c)   take a photo and send it for decoding
  retake   (r)   discard the staged photo
  save     (s)   keep the staged photo in the gallery
  delete N (d)   remove gallery entry N
  download N     save gallery entry N to the downloads directory
  gallery  (g)   list saved captures
  help     (h)   show this help
  quit     (q)   stop the camera and exit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_verbs_and_aliases() {
        assert_eq!(Command::parse("capture").unwrap(), Command::Capture);
        assert_eq!(Command::parse("c").unwrap(), Command::Capture);
        assert_eq!(Command::parse("  RETAKE ").unwrap(), Command::Retake);
        assert_eq!(Command::parse("q").unwrap(), Command::Quit);
    }

    #[test]
    fn parses_indexed_commands() {
        assert_eq!(Command::parse("delete 2").unwrap(), Command::Delete(2));
        assert_eq!(Command::parse("download 0").unwrap(), Command::Download(0));
        assert!(Command::parse("delete").is_err());
        assert!(Command::parse("delete two").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(Command::parse("").is_err());
        assert!(Command::parse("selfie").is_err());
        assert!(Command::parse("capture now").is_err());
    }
}
