//! Shell completion generation
//!
//! Scripts are generated straight from the registries: command tree,
//! per-scope flags, and short forms. Each emitter produces the marker its
//! shell expects (`function __<app>_completion`, `#compdef`,
//! `complete -c`, `Register-ArgumentCompleter`).

use std::fmt;
use std::fmt::Write;

use crate::command::Command;
use crate::parser::Parser;
use crate::registry::split_key;

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

impl Shell {
    /// File extension conventionally used for completion files.
    pub fn file_extension(self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
            Shell::PowerShell => "ps1",
        }
    }

    /// Short installation hint for this shell.
    pub fn install_instructions(self, app_name: &str) -> String {
        match self {
            Shell::Bash => format!("# add to ~/.bashrc:\n# source <({app_name} completion bash)"),
            Shell::Zsh => format!(
                "# save to a directory on $fpath:\n# {app_name} completion zsh > ~/.zsh/completions/_{app_name}"
            ),
            Shell::Fish => format!(
                "# save to the fish completions directory:\n# {app_name} completion fish > ~/.config/fish/completions/{app_name}.fish"
            ),
            Shell::PowerShell => format!(
                "# add to your PowerShell profile:\n# {app_name} completion powershell | Out-String | Invoke-Expression"
            ),
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bash => write!(f, "bash"),
            Self::Zsh => write!(f, "zsh"),
            Self::Fish => write!(f, "fish"),
            Self::PowerShell => write!(f, "powershell"),
        }
    }
}

impl std::str::FromStr for Shell {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            "fish" => Ok(Shell::Fish),
            "powershell" | "posh" | "pwsh" => Ok(Shell::PowerShell),
            _ => Err(format!("unknown shell '{s}'. Supported: bash, zsh, fish, powershell")),
        }
    }
}

pub(crate) fn generate(parser: &Parser, shell: Shell, app_name: &str) -> String {
    let model = Model::collect(parser);
    match shell {
        Shell::Bash => bash(&model, app_name),
        Shell::Zsh => zsh(&model, app_name),
        Shell::Fish => fish(&model, app_name),
        Shell::PowerShell => powershell(&model, app_name),
    }
}

struct FlagEntry {
    long: String,
    short: Option<String>,
    description: String,
    scope: String,
}

struct CommandEntry {
    name: String,
    path: String,
    description: String,
}

struct Model {
    flags: Vec<FlagEntry>,
    commands: Vec<CommandEntry>,
}

impl Model {
    fn collect(parser: &Parser) -> Self {
        let mut flags = Vec::new();
        for (key, arg) in parser.registry_view().flags() {
            let (name, scope) = split_key(key);
            flags.push(FlagEntry {
                long: name.to_string(),
                short: arg.short_form().map(str::to_string),
                description: arg.description_text().to_string(),
                scope: scope.to_string(),
            });
        }
        let mut commands = Vec::new();
        fn visit(node: &Command, out: &mut Vec<CommandEntry>) {
            out.push(CommandEntry {
                name: node.name_ref().to_string(),
                path: node.path().to_string(),
                description: node.description_text().to_string(),
            });
            for sub in node.children() {
                visit(sub, out);
            }
        }
        for root in parser.registry_view().roots() {
            visit(root, &mut commands);
        }
        Self { flags, commands }
    }

    fn all_flag_words(&self) -> Vec<String> {
        let mut out = Vec::new();
        for flag in &self.flags {
            out.push(format!("--{}", flag.long));
            if let Some(short) = &flag.short {
                out.push(format!("-{short}"));
            }
        }
        out
    }

    fn root_command_names(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter(|c| c.path == c.name)
            .map(|c| c.name.clone())
            .collect()
    }
}

fn quote(text: &str) -> String {
    text.replace('\'', "\\'")
}

fn bash(model: &Model, app: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# bash completion for {app}");
    let _ = writeln!(out, "function __{app}_completion() {{");
    let _ = writeln!(out, "    local cur prev");
    let _ = writeln!(out, "    cur=\"${{COMP_WORDS[COMP_CWORD]}}\"");
    let _ = writeln!(out, "    prev=\"${{COMP_WORDS[COMP_CWORD-1]}}\"");
    let _ = writeln!(out, "    local flags=\"{}\"", model.all_flag_words().join(" "));
    let _ = writeln!(out, "    local commands=\"{}\"", model.root_command_names().join(" "));
    let _ = writeln!(out, "    if [[ ${{cur}} == -* ]]; then");
    let _ = writeln!(out, "        COMPREPLY=( $(compgen -W \"${{flags}}\" -- \"${{cur}}\") )");
    let _ = writeln!(out, "        return 0");
    let _ = writeln!(out, "    fi");
    let _ = writeln!(out, "    case \"${{prev}}\" in");
    for cmd in &model.commands {
        let child_prefix = format!("{} ", cmd.path);
        let subs: Vec<&str> = model
            .commands
            .iter()
            .filter(|c| c.path.starts_with(&child_prefix) && c.path[child_prefix.len()..] == c.name)
            .map(|c| c.name.as_str())
            .collect();
        if !subs.is_empty() {
            let _ = writeln!(out, "        {})", cmd.name);
            let _ = writeln!(
                out,
                "            COMPREPLY=( $(compgen -W \"{}\" -- \"${{cur}}\") )",
                subs.join(" ")
            );
            let _ = writeln!(out, "            return 0 ;;");
        }
    }
    let _ = writeln!(out, "    esac");
    let _ = writeln!(out, "    COMPREPLY=( $(compgen -W \"${{commands}}\" -- \"${{cur}}\") )");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out, "complete -F __{app}_completion {app}");
    out
}

fn zsh(model: &Model, app: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#compdef {app}");
    let _ = writeln!(out);
    let _ = writeln!(out, "_{app}() {{");
    let _ = writeln!(out, "    local -a commands flags");
    let _ = writeln!(out, "    commands=(");
    for cmd in &model.commands {
        if cmd.path == cmd.name {
            let _ = writeln!(out, "        '{}:{}'", cmd.name, quote(&cmd.description));
        }
    }
    let _ = writeln!(out, "    )");
    let _ = writeln!(out, "    flags=(");
    for flag in &model.flags {
        let _ = writeln!(out, "        '--{}[{}]'", flag.long, quote(&flag.description));
    }
    let _ = writeln!(out, "    )");
    let _ = writeln!(out, "    _arguments $flags '1: :->cmds' '*::arg:->args'");
    let _ = writeln!(out, "    case $state in");
    let _ = writeln!(out, "        cmds) _describe 'command' commands ;;");
    let _ = writeln!(out, "    esac");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
    let _ = writeln!(out, "_{app} \"$@\"");
    out
}

fn fish(model: &Model, app: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# fish completion for {app}");
    let _ = writeln!(out, "complete -c {app} -f");
    for cmd in &model.commands {
        if cmd.path == cmd.name {
            let _ = writeln!(
                out,
                "complete -c {app} -n __fish_use_subcommand -a {} -d '{}'",
                cmd.name,
                quote(&cmd.description)
            );
        } else {
            let parent = cmd.path.rsplit_once(' ').map(|(p, _)| p).unwrap_or("");
            let condition = parent.replace(' ', "; and __fish_seen_subcommand_from ");
            let _ = writeln!(
                out,
                "complete -c {app} -n '__fish_seen_subcommand_from {condition}' -a {} -d '{}'",
                cmd.name,
                quote(&cmd.description)
            );
        }
    }
    for flag in &model.flags {
        let mut line = format!("complete -c {app} -l {}", flag.long);
        if let Some(short) = &flag.short {
            line.push_str(&format!(" -s {short}"));
        }
        if !flag.description.is_empty() {
            line.push_str(&format!(" -d '{}'", quote(&flag.description)));
        }
        if !flag.scope.is_empty() {
            let first = flag.scope.split(' ').next().unwrap_or("");
            line.push_str(&format!(" -n '__fish_seen_subcommand_from {first}'"));
        }
        let _ = writeln!(out, "{line}");
    }
    out
}

fn powershell(model: &Model, app: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# powershell completion for {app}");
    let _ = writeln!(
        out,
        "Register-ArgumentCompleter -Native -CommandName {app} -ScriptBlock {{"
    );
    let _ = writeln!(out, "    param($wordToComplete, $commandAst, $cursorPosition)");
    let _ = writeln!(out, "    $completions = @(");
    for cmd in &model.commands {
        if cmd.path == cmd.name {
            let _ = writeln!(
                out,
                "        [System.Management.Automation.CompletionResult]::new('{}', '{}', 'ParameterValue', '{}')",
                cmd.name,
                cmd.name,
                quote(if cmd.description.is_empty() { &cmd.name } else { &cmd.description })
            );
        }
    }
    for word in model.all_flag_words() {
        let _ = writeln!(
            out,
            "        [System.Management.Automation.CompletionResult]::new('{word}', '{word}', 'ParameterName', '{word}')"
        );
    }
    let _ = writeln!(out, "    )");
    let _ = writeln!(
        out,
        "    $completions | Where-Object {{ $_.CompletionText -like \"$wordToComplete*\" }}"
    );
    let _ = writeln!(out, "}}");
    out
}
