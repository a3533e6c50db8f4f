use crate::commands::{apply, parse, query, schema, search};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "schema",
            groups: schema::EXAMPLES,
        },
        CommandExample {
            name: "parse",
            groups: parse::EXAMPLES,
        },
        CommandExample {
            name: "query",
            groups: query::EXAMPLES,
        },
        CommandExample {
            name: "apply",
            groups: apply::EXAMPLES,
        },
        CommandExample {
            name: "search",
            groups: search::EXAMPLES,
        },
    ]
}
