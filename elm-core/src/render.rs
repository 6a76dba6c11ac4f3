use crate::{AliasInfo, Name, Ty, TyFunction, TyRecord, TyUnion, TyVar, Typeclass, VarId};
use fnv::{FnvHashMap, FnvHashSet};

const VAR_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// The `n`th name in `a, b, ..., z, a1, b1, ..., z1, a2, ...`.
pub fn nth_var_name(n: usize) -> String {
    let letter = VAR_LETTERS[n % 26] as char;
    if n < 26 {
        letter.to_string()
    } else {
        format!("{}{}", letter, n / 26)
    }
}

struct Renderer {
    qualify: bool,
    var_names: FnvHashMap<VarId, Name>,
    taken: FnvHashSet<Name>,
}

impl Renderer {
    fn render(&mut self, ty: &Ty) -> String {
        if let Some(alias) = ty.alias() {
            return self.render_alias(alias);
        }
        match ty {
            Ty::Unit => String::from("()"),
            Ty::Var(var) => self.render_var(var).to_string(),
            Ty::Union(union) => self.render_union(union),
            Ty::Tuple(items) => {
                let items: Vec<String> = items.iter().map(|item| self.render(item)).collect();
                format!("( {} )", items.join(", "))
            }
            Ty::Record(record) => self.render_record(record),
            Ty::MutableRecord(_) => String::from("{ .. }"),
            Ty::Function(function) => self.render_function(function),
            Ty::Unknown | Ty::InProgressBinding => String::from("unknown"),
        }
    }

    /*
    Distinct variables that share a name get the next unused name instead. Constrained
    variables are identified by their name, so they keep it.
    */
    fn render_var(&mut self, var: &TyVar) -> Name {
        if let Some(name) = self.var_names.get(&var.id) {
            return name.clone();
        }
        let name = if Typeclass::of(&var.name).is_some() || !self.taken.contains(&var.name) {
            var.name.clone()
        } else {
            let taken = &self.taken;
            let fresh = (0..)
                .map(nth_var_name)
                .find(|candidate| !taken.contains(candidate.as_str()))
                .unwrap_or_default();
            Name::from(fresh)
        };
        self.taken.insert(name.clone());
        self.var_names.insert(var.id, name.clone());
        name
    }

    fn render_function(&mut self, function: &TyFunction) -> String {
        let mut segments = Vec::with_capacity(function.parameters.len() + 1);
        for ty in function.parameters.iter().chain(std::iter::once(&function.ret)) {
            let rendered = self.render(ty);
            if matches!(ty, Ty::Function(_)) && ty.alias().is_none() {
                segments.push(format!("({})", rendered));
            } else {
                segments.push(rendered);
            }
        }
        segments.join(" -> ")
    }

    fn render_applied(&mut self, module: &Name, name: &Name, parameters: &[Ty]) -> String {
        let mut rendered = if self.qualify && !module.is_empty() {
            format!("{}.{}", module, name)
        } else {
            name.to_string()
        };
        for parameter in parameters {
            let needs_parens = match parameter {
                _ if parameter.alias().map_or(false, |alias| !alias.parameters.is_empty()) => true,
                _ if parameter.alias().is_some() => false,
                Ty::Function(_) => true,
                Ty::Union(union) => !union.parameters.is_empty(),
                _ => false,
            };
            rendered.push(' ');
            if needs_parens {
                rendered.push('(');
                rendered.push_str(&self.render(parameter));
                rendered.push(')');
            } else {
                rendered.push_str(&self.render(parameter));
            }
        }
        rendered
    }

    fn render_union(&mut self, union: &TyUnion) -> String {
        self.render_applied(&union.module, &union.name, &union.parameters)
    }

    fn render_alias(&mut self, alias: &AliasInfo) -> String {
        self.render_applied(&alias.module, &alias.name, &alias.parameters)
    }

    fn render_record(&mut self, record: &TyRecord) -> String {
        let fields: Vec<String> = record
            .fields
            .iter()
            .map(|(name, ty)| format!("{} : {}", name, self.render(ty)))
            .collect();
        match &record.base {
            Some(base) if fields.is_empty() => self.render(base),
            Some(base) => {
                let base = self.render(base);
                format!("{{ {} | {} }}", base, fields.join(", "))
            }
            None if fields.is_empty() => String::from("{}"),
            None => format!("{{ {} }}", fields.join(", ")),
        }
    }
}

impl Ty {
    /**
    Render this type as Elm source.

    When `qualify` is true, union and alias names are prefixed with their module.

    # Examples

    ```
    use elm_core::{Name, Ty};

    let ty = Ty::function(vec![Ty::list(Ty::int())], Ty::record(vec![(Name::from("x"), Ty::string())]));
    assert_eq!(ty.rendered_text(false), "List Int -> { x : String }");
    assert_eq!(ty.rendered_text(true), "List.List Basics.Int -> { x : String.String }");
    ```
    */
    pub fn rendered_text(&self, qualify: bool) -> String {
        Renderer {
            qualify,
            var_names: FnvHashMap::default(),
            taken: FnvHashSet::default(),
        }
        .render(self)
    }
}
