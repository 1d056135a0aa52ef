#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    GenKey,
    Encrypt,
    Decrypt,
    Detect,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Default, Eq, PartialEq)]
pub struct Args {
    pub command: Option<Command>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub key: Option<String>,
    pub key_output: Option<String>,
    pub algorithm: Option<String>,
    pub short_help: bool,
    pub long_help: bool,
    pub version: bool,
}

impl Args {
    pub fn build_from_args<I>(mut cli_args: I) -> Result<Self, String>
    where
        I: Iterator<Item: AsRef<str> + ToString>,
    {
        let mut args = Self::default();
        let mut positionals: Vec<String> = Vec::new();

        #[allow(clippy::while_let_on_iterator)] // Need it for value-taking options.
        while let Some(arg) = cli_args.next() {
            let some_command = args.command.is_some();

            match arg.as_ref() {
                "genkey" if !some_command => args.command = Some(Command::GenKey),
                "encrypt" if !some_command => args.command = Some(Command::Encrypt),
                "decrypt" if !some_command => args.command = Some(Command::Decrypt),
                "detect" if !some_command => args.command = Some(Command::Detect),
                "-h" => args.short_help = true,
                "--help" => args.long_help = true,
                "-V" | "--version" => args.version = true,
                "--key" => {
                    args.key = Some(
                        cli_args
                            .next()
                            .ok_or_else(|| "'--key' requires a value".to_string())?
                            .to_string(),
                    );
                }
                "--key-out" => {
                    args.key_output = Some(
                        cli_args
                            .next()
                            .ok_or_else(|| "'--key-out' requires a value".to_string())?
                            .to_string(),
                    );
                }
                "-a" | "--algorithm" => {
                    args.algorithm = Some(
                        cli_args
                            .next()
                            .ok_or_else(|| "'--algorithm' requires a value".to_string())?
                            .to_string(),
                    );
                }
                positional if some_command => positionals.push(positional.to_string()),
                unknown => {
                    return Err(format!("Unknown argument: '{unknown}'"));
                }
            }
        }

        let mut positionals = positionals.into_iter();
        args.input = positionals.next();
        args.output = positionals.next();

        Ok(args)
    }
}
