//! End-of-input post-pass
//!
//! Order: (a) external-defaults / environment / declared-default fallback
//! for unset flags, (b) positional-slot assignment with gap defaults,
//! (c) required and conditionally-required evaluation, (d) dependency
//! evaluation (warnings, plus structural cycle errors). Terminal-command
//! scheduling already happened during the walk, in FIFO order.

use std::collections::HashMap;

use crate::arg::{ArgType, Argument};
use crate::binding::truthy;
use crate::error::{keys, ParseError};
use crate::registry::split_key;

use super::acquire::{self, ValueSource};
use super::{Parser, PositionalArg};

pub(crate) fn run(parser: &mut Parser, external: Option<&HashMap<String, String>>) {
    fallback_pass(parser, external);
    positional_pass(parser);
    required_pass(parser);
    dependency_pass(parser);
}

fn has_value(parser: &Parser, key: &str) -> bool {
    parser.state.options.contains_key(key) || parser.state.lists.contains_key(key)
}

fn declarations(parser: &Parser) -> Vec<(String, Argument)> {
    parser.registry.flags().map(|(k, a)| (k.to_string(), a.clone())).collect()
}

/// Source precedence below the command line: external defaults, then
/// environment (when a converter is configured), then the declared default.
fn fallback_pass(parser: &mut Parser, external: Option<&HashMap<String, String>>) {
    let env_converter = parser.settings.env_name_converter.clone();
    for (key, arg) in declarations(parser) {
        if arg.position_index().is_some() || has_value(parser, &key) {
            continue;
        }
        let (name, _) = split_key(&key);
        let name = name.to_string();

        let mut candidate: Option<(String, ValueSource)> = None;
        if let Some(defaults) = external {
            if let Some(value) = defaults.get(&key).or_else(|| defaults.get(&name)) {
                candidate = Some((value.clone(), ValueSource::External));
            }
        }
        if candidate.is_none() {
            if let Some(converter) = &env_converter {
                let env_key = converter.as_ref()(&name);
                if let Some(value) = parser.env.get(&env_key) {
                    tracing::debug!(key = %key, env_key = %env_key, "environment fallback");
                    candidate = Some((value, ValueSource::Env));
                }
            }
        }
        if candidate.is_none() {
            if let Some(default) = arg.default() {
                candidate = Some((default.to_string(), ValueSource::Declared));
            }
        }

        if let Some((value, source)) = candidate {
            if arg.effective_type() == ArgType::Standalone {
                acquire::store_bool(parser, &key, truthy(&value));
            } else {
                acquire::process_and_store(parser, &key, &arg, &value, source);
            }
        }
    }
}

/// Assign queued tokens to positional-indexed flags in position order,
/// filling exhausted slots from their defaults.
fn positional_pass(parser: &mut Parser) {
    let mut declared: Vec<(String, usize, Argument)> = parser
        .registry
        .flags()
        .filter_map(|(k, a)| a.position_index().map(|p| (k.to_string(), p, a.clone())))
        .collect();
    // stable sort keeps declaration order between equal positions
    declared.sort_by_key(|(_, position, _)| *position);

    let queue = std::mem::take(&mut parser.state.positionals);
    let mut result: Vec<PositionalArg> = Vec::new();
    let mut consumed = 0;

    for (key, position, arg) in declared {
        let name = split_key(&key).0.to_string();
        if consumed < queue.len() {
            let token = queue[consumed].value.clone();
            consumed += 1;
            let accepted =
                acquire::process_and_store(parser, &key, &arg, &token, ValueSource::Cli);
            let value = if accepted {
                parser.state.options.get(&key).cloned().unwrap_or(token)
            } else {
                token
            };
            result.push(PositionalArg { value, position, flag: Some(name) });
        } else if let Some(default) = arg.default() {
            let default = default.to_string();
            acquire::process_and_store(parser, &key, &arg, &default, ValueSource::Declared);
            result.push(PositionalArg { value: default, position, flag: Some(name) });
        } else if arg.is_required() {
            parser.push_error(ParseError::RequiredPositionalFlag { name, position });
        }
    }

    let mut next = result.iter().map(|p| p.position + 1).max().unwrap_or(0);
    for extra in queue.into_iter().skip(consumed) {
        result.push(PositionalArg { value: extra.value, position: next, flag: None });
        next += 1;
    }
    parser.state.positionals = result;
}

/// One error per unsatisfied required (or conditionally required) flag,
/// citing the display name.
fn required_pass(parser: &mut Parser) {
    for (key, arg) in declarations(parser) {
        if arg.position_index().is_some() || has_value(parser, &key) {
            continue;
        }
        // a flag scoped to a command is only required when that command (or
        // one of its descendants) actually appeared on the line
        let (_, scope) = split_key(&key);
        if !scope.is_empty() {
            let descendant_prefix = format!("{scope} ");
            let active = parser
                .state
                .visited
                .iter()
                .any(|p| p == scope || p.starts_with(&descendant_prefix));
            if !active {
                continue;
            }
        }
        let conditionally = arg
            .required_if_ref()
            .map(|predicate| predicate.as_ref()(parser))
            .unwrap_or(false);
        if arg.is_required() || conditionally {
            let (name, _) = split_key(&key);
            let display = parser.display_flag_name(name);
            parser.push_error(ParseError::RequiredFlag { name: display });
        }
    }
}

/// Unmet or mismatched dependencies are warnings; structural cycles in the
/// dependency graph are errors.
fn dependency_pass(parser: &mut Parser) {
    detect_cycles(parser);
    for (key, arg) in declarations(parser) {
        if !has_value(parser, &key) || arg.dependencies().is_empty() {
            continue;
        }
        let (name, scope) = split_key(&key);
        let name = name.to_string();
        let scope = scope.to_string();
        for (dependency, allowed) in arg.dependencies() {
            let resolved = parser
                .registry
                .flag(dependency, &scope)
                .map(|(dep_key, _)| dep_key.to_string());
            match resolved {
                None => {
                    parser.push_warning_message(
                        keys::DEPENDENCY_NOT_FOUND,
                        vec![name.clone(), dependency.clone()],
                    );
                }
                Some(dep_key) => {
                    let dep_value = parser.state.options.get(&dep_key).cloned();
                    match dep_value {
                        None => parser.push_warning_message(
                            keys::DEPENDENCY_NOT_SET,
                            vec![name.clone(), dependency.clone()],
                        ),
                        Some(value) => {
                            if !allowed.is_empty() && !allowed.iter().any(|a| a == &value) {
                                parser.push_warning_message(
                                    keys::DEPENDENCY_VALUE_MISMATCH,
                                    vec![
                                        name.clone(),
                                        dependency.clone(),
                                        allowed.join(", "),
                                        value,
                                    ],
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Depth-first search over the flag dependency graph (by canonical name).
fn detect_cycles(parser: &mut Parser) {
    let graph: HashMap<String, Vec<String>> = parser
        .registry
        .flags()
        .map(|(key, arg)| {
            (
                split_key(key).0.to_string(),
                arg.dependencies().keys().cloned().collect::<Vec<_>>(),
            )
        })
        .collect();
    let max_depth = parser.settings.max_depth;

    let mut cleared: Vec<String> = Vec::new();
    let mut reported = false;
    for start in graph.keys() {
        if cleared.contains(start) || reported {
            continue;
        }
        let mut stack: Vec<String> = Vec::new();
        if let Some(chain) = visit(&graph, start, &mut stack, &mut cleared, max_depth) {
            parser.push_error(chain);
            reported = true;
        }
    }
}

fn visit(
    graph: &HashMap<String, Vec<String>>,
    node: &str,
    stack: &mut Vec<String>,
    cleared: &mut Vec<String>,
    max_depth: usize,
) -> Option<ParseError> {
    if stack.iter().any(|n| n == node) {
        let mut chain: Vec<String> = stack.clone();
        chain.push(node.to_string());
        return Some(ParseError::CircularDependency { chain: chain.join(" -> ") });
    }
    if stack.len() >= max_depth {
        return Some(ParseError::RecursionDepthExceeded { context: node.to_string() });
    }
    if cleared.contains(&node.to_string()) {
        return None;
    }
    stack.push(node.to_string());
    if let Some(deps) = graph.get(node) {
        for dep in deps {
            if let Some(error) = visit(graph, dep, stack, cleared, max_depth) {
                return Some(error);
            }
        }
    }
    stack.pop();
    cleared.push(node.to_string());
    None
}
