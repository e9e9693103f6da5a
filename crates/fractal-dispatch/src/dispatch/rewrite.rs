//! Expansion of shortcut invocations into the canonical
//! `<program> <plugin> <command> ...` form.

use std::ffi::OsString;

use crate::alias::AliasRegistry;

use super::DefaultTarget;

const ROOT_TOGGLES: [&str; 2] = ["-d", "--debug"];

/// Rewrites `args` (program name first) without touching the caller's copy.
///
/// Leading root toggles are set aside, the first remaining token is
/// checked against the alias table, then against the default-controller
/// rule, and the toggles are put back in front.
pub(crate) fn rewrite(
    program: &str,
    args: &[OsString],
    aliases: &AliasRegistry,
    default: Option<&DefaultTarget>,
) -> Vec<OsString> {
    let (head, rest) = args
        .split_first()
        .map_or_else(
            || (OsString::from(program), &[][..]),
            |(head, rest)| (head.clone(), rest),
        );
    let split = rest
        .iter()
        .position(|token| !is_root_toggle(token))
        .unwrap_or(rest.len());
    let (toggles, command) = rest.split_at(split);

    let mut rewritten = Vec::with_capacity(args.len() + 2);
    rewritten.push(head);
    rewritten.extend_from_slice(toggles);

    let Some((first, tail)) = command.split_first() else {
        match default {
            Some(target) => push_target(&mut rewritten, target.controller_name(), target.method()),
            None => rewritten.push(OsString::from("--help")),
        }
        return rewritten;
    };

    let token = first.to_string_lossy();
    if let Some(entry) = aliases.resolve(&token) {
        push_target(&mut rewritten, entry.plugin(), entry.command());
        rewritten.extend_from_slice(tail);
        return rewritten;
    }
    let wants_default = token.starts_with("--") && !token.contains("help");
    if let Some(target) = default.filter(|_| wants_default) {
        push_target(&mut rewritten, target.controller_name(), target.method());
    }
    rewritten.extend_from_slice(command);
    rewritten
}

fn push_target(args: &mut Vec<OsString>, plugin: &str, method: &str) {
    args.push(OsString::from(plugin));
    args.push(OsString::from(method));
}

fn is_root_toggle(token: &OsString) -> bool {
    token
        .to_str()
        .is_some_and(|text| ROOT_TOGGLES.contains(&text))
}
