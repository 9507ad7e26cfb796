//! Cycle detection over the declared bean graph.
//!
//! Runs before any property is built, so a cyclic declaration never reaches a
//! constructor. The walk carries its own visiting stack; nothing is kept in
//! thread-local or global state.

use std::collections::{HashMap, HashSet};

use crate::definition::{ArgValue, BeanSpec};
use crate::error::{DiError, DiResult};

/// Rejects the first cycle reachable from any top-level bean.
///
/// Edges are nested beans, references to beans declared in the same set and
/// factory bean references. References to external beans or to parent
/// contexts leave the set and cannot close a cycle. Identifiers must already
/// be assigned.
pub(crate) fn detect_cycles(beans: &[BeanSpec]) -> DiResult<()> {
    let mut index = HashMap::new();
    for bean in beans {
        collect(bean, &mut index);
    }

    let mut finished = HashSet::new();
    for bean in beans {
        let mut visiting = Vec::new();
        visit(bean, &index, &mut visiting, &mut finished)?;
    }
    Ok(())
}

fn collect<'a>(bean: &'a BeanSpec, index: &mut HashMap<&'a str, &'a BeanSpec>) {
    if let Some(id) = bean.id.as_deref() {
        index.entry(id).or_insert(bean);
    }
    for arg in &bean.args {
        collect_value(&arg.value, index);
    }
}

fn collect_value<'a>(value: &'a ArgValue, index: &mut HashMap<&'a str, &'a BeanSpec>) {
    match value {
        ArgValue::Bean(nested) => collect(nested, index),
        ArgValue::List(list) => list.items.iter().for_each(|item| collect_value(item, index)),
        ArgValue::Literal { .. } | ArgValue::Ref { .. } => {}
    }
}

fn visit<'a>(
    bean: &'a BeanSpec,
    index: &HashMap<&'a str, &'a BeanSpec>,
    visiting: &mut Vec<&'a str>,
    finished: &mut HashSet<&'a str>,
) -> DiResult<()> {
    let id = bean.display_id();
    if let Some(start) = visiting.iter().position(|v| *v == id) {
        let mut path: Vec<String> = visiting[start..].iter().map(|v| v.to_string()).collect();
        path.push(id.to_string());
        return Err(DiError::Circular {
            bean: id.to_string(),
            type_name: bean.display_type(),
            path,
        });
    }
    if finished.contains(id) {
        return Ok(());
    }

    visiting.push(id);
    if let Some(target) = bean.factory.as_ref().and_then(|f| f.bean.as_deref()) {
        follow(target, index, visiting, finished)?;
    }
    for arg in &bean.args {
        visit_value(&arg.value, index, visiting, finished)?;
    }
    visiting.pop();
    finished.insert(id);
    Ok(())
}

fn visit_value<'a>(
    value: &'a ArgValue,
    index: &HashMap<&'a str, &'a BeanSpec>,
    visiting: &mut Vec<&'a str>,
    finished: &mut HashSet<&'a str>,
) -> DiResult<()> {
    match value {
        ArgValue::Bean(nested) => visit(nested, index, visiting, finished),
        ArgValue::Ref { id, .. } => follow(id, index, visiting, finished),
        ArgValue::List(list) => list
            .items
            .iter()
            .try_for_each(|item| visit_value(item, index, visiting, finished)),
        ArgValue::Literal { .. } => Ok(()),
    }
}

fn follow<'a>(
    id: &str,
    index: &HashMap<&'a str, &'a BeanSpec>,
    visiting: &mut Vec<&'a str>,
    finished: &mut HashSet<&'a str>,
) -> DiResult<()> {
    match index.get(id) {
        Some(&target) => visit(target, index, visiting, finished),
        None => Ok(()),
    }
}
