use pretty_assertions::assert_eq;
use pug_lexer::{
    ErrorKind, ExprContext, LexError, Lexer, LooseExpressions, Options, ScriptExpressions,
    TokenKind, lex, lex_with,
};

fn lex_err(source: &str) -> LexError {
    match lex(source) {
        Ok(root) => panic!("expected an error, got:\n{}", root.dump()),
        Err(err) => err,
    }
}

mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tag_with_modifiers() {
        let root = lex("div.foo#bar(id=\"x\", data-n=1)\n").unwrap();
        insta::assert_snapshot!(root.dump(), @r#"
        Root
          Line
            LineData
              Tag "div"
                TagClassNote "foo"
                TagIdNote "bar"
                TagAttrList
                  AttrPairEscaped "id" expr="\"x\""
                  AttrPairEscaped "data-n" expr="1"
        "#);
    }

    #[test]
    fn text_with_interpolation() {
        let root = lex("p Hello #{name}!\n").unwrap();
        insta::assert_snapshot!(root.dump(), @r##"
        Root
          Line
            LineData
              Tag "p"
                LinePlainText
                  PlainText "Hello "
                  OutputEscaped "#{name}" expr="name"
                  PlainText "!"
        "##);
    }

    #[test]
    fn escaped_interpolation_stays_literal() {
        let root = lex("p Hello \\#{name}!\n").unwrap();
        insta::assert_snapshot!(root.dump(), @r##"
        Root
          Line
            LineData
              Tag "p"
                LinePlainText
                  PlainText "Hello "
                  PlainText "#{name}!"
        "##);
    }

    #[test]
    fn indentation_regression_is_mixed() {
        let err = lex_err("div\n    p\n  span\n");
        assert_eq!(err.kind, ErrorKind::MixedIndentation);
        assert_eq!(err.offset, 12);
    }

    #[test]
    fn code_loop() {
        let root = lex("- for i in 0..3\n  p= i\n").unwrap();
        insta::assert_snapshot!(root.dump(), @r#"
        Root
          Line
            ControlEach "for" expr="0..3"
              EachVariable "i"
            Line
              LineData
                Tag "p"
                  OutputEscaped "= i" expr="i"
        "#);
    }

    #[test]
    fn mixin_call_with_arguments() {
        let root = lex("+button(label=\"Go\")\n").unwrap();
        insta::assert_snapshot!(root.dump(), @r#"
        Root
          Line
            MixinCall "button"
              MixinArgs "label=\"Go\"" expr="label=\"Go\""
        "#);
    }
}

mod structure {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn followed_by_nests_under_tag() {
        let root = lex("ul\n  li: a(href=\"/\") Home\n").unwrap();
        insta::assert_snapshot!(root.dump(), @r#"
        Root
          Line
            LineData
              Tag "ul"
            Line
              LineData
                Tag "li"
                  Line
                    LineData
                      Tag "a"
                        TagAttrList
                          AttrPairEscaped "href" expr="\"/\""
                        LinePlainText
                          PlainText "Home"
        "#);
    }

    #[test]
    fn dedent_returns_to_ancestor() {
        let root = lex("html\n  body\n    main\n      p\nfooter\n").unwrap();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].line_depth(), 4);
        assert_eq!(root.children[1].text, "footer");
    }

    #[test]
    fn tabs_are_one_level_each() {
        let root = lex("ul\n\tli\n\t\ta\n").unwrap();
        assert_eq!(root.line_depth(), 3);
    }

    #[test]
    fn crlf_line_endings() {
        let root = lex("ul\r\n  li one\r\n  li two\r\n").unwrap();
        let texts: Vec<_> = root.children[0].lines().map(|l| l.text).collect();
        assert_eq!(texts, ["li one", "li two"]);
    }

    #[test]
    fn verbatim_block_keeps_deeper_indentation() {
        let root = lex("pre.\n  line one\n    indented #{x}\nfooter\n").unwrap();
        insta::assert_snapshot!(root.dump(), @r##"
        Root
          Line
            LineData
              Tag "pre"
                TagDotBlock "."
            Line
              LinePlainText
                PlainText "line one"
            Line
              LinePlainText
                PlainText "  indented "
                OutputEscaped "#{x}" expr="x"
          Line
            LineData
              Tag "footer"
        "##);
    }

    #[test]
    fn control_flow_tree() {
        let source = "if user\n  p Hi\nelse if guest\n  p Welcome\nelse\n  a(href=\"/login\") Log in\n";
        let root = lex(source).unwrap();
        let kinds: Vec<_> = root
            .children
            .iter()
            .map(|line| line.payload().unwrap().kind)
            .collect();
        assert_eq!(
            kinds,
            [TokenKind::ControlIf, TokenKind::ControlElseIf, TokenKind::ControlElse]
        );
        for line in &root.children {
            assert_eq!(line.lines().count(), 1);
        }
    }

    #[test]
    fn mixin_definition_and_call() {
        let source = "mixin card(title)\n  .card\n    h2= title\n+card('Hi').wide\n";
        let root = lex(source).unwrap();
        let definition = root.children[0].payload().unwrap();
        assert_eq!(definition.kind, TokenKind::MixinDefinition);
        assert_eq!(definition.text, "card");

        let call = root.children[1].payload().unwrap();
        assert_eq!(call.kind, TokenKind::MixinCall);
        let kinds: Vec<_> = call.children.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, [TokenKind::MixinArgs, TokenKind::TagClassNote]);
    }

    #[test]
    fn multiple_spread_attributes() {
        let root = lex("div&attributes(a)&attributes(b)\n").unwrap();
        let tag = &root.children[0].payload().unwrap().children[0];
        let spreads: Vec<_> = tag
            .children_of(TokenKind::TagAttributes)
            .filter_map(|t| t.expr_text())
            .collect();
        assert_eq!(spreads, ["a", "b"]);
    }

    #[test]
    fn spans_index_the_source() {
        let source = "doctype html\nhtml(lang=\"en\")\n  body.page\n    | Hi #{name}\n";
        let root = lex(source).unwrap();
        root.walk(&mut |token| {
            assert_eq!(&source[token.span.start..token.span.end], token.text);
            if let Some(expr) = &token.expr {
                assert_eq!(&source[expr.span.start..expr.span.end], expr.text);
            }
        });
    }
}

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn jump_by_two_levels() {
        let err = lex_err("div\n  p\n      span\n");
        assert_eq!(err.kind, ErrorKind::InvalidIndentationJump);
        assert_eq!(err.offset, 14);
    }

    #[test]
    fn first_line_indented() {
        assert_eq!(lex_err("  p\n").kind, ErrorKind::InvalidIndentationJump);
    }

    #[test]
    fn tab_after_spaces() {
        let err = lex_err("div\n  p\n\tspan\n");
        assert_eq!(err.kind, ErrorKind::MixedIndentation);
        assert_eq!(err.help.as_deref(), Some("indentation uses 2 spaces"));
    }

    #[test]
    fn unterminated_code_statement() {
        let err = lex_err("- var a = [1, 2\n");
        assert_eq!(err.kind, ErrorKind::InvalidExpression(ExprContext::Code));
    }

    #[test]
    fn mixin_call_without_name() {
        assert_eq!(lex_err("+(x)\n").kind, ErrorKind::UnexpectedCharacter);
    }

    #[test]
    fn mixin_call_with_bad_arguments() {
        let err = lex_err("+card(]\n");
        assert_eq!(err.kind, ErrorKind::InvalidExpression(ExprContext::MixinCall));
    }

    #[test]
    fn data_after_dot() {
        assert_eq!(lex_err("p. text\n").kind, ErrorKind::DataAfterEndlineTag);
    }

    #[test]
    fn render_through_sink() {
        let source = "div\n    p\n  span\n";
        let mut out = String::new();
        let lexer = Lexer::new(source, LooseExpressions, Options::default());
        let err = lexer.perform(|msg| out.push_str(msg)).unwrap_err();

        assert_eq!(
            out,
            format!(
                "-> 3:   span\n{}^ Mixed indentation\nhelp: indentation uses 4 spaces; this line has 2 spaces\n",
                " ".repeat(8)
            )
        );
        let loc = err.location(source);
        assert_eq!((loc.line, loc.col), (3, 3));
    }

    #[test]
    fn success_leaves_sink_untouched() {
        let mut calls = 0;
        let lexer = Lexer::new("p ok\n", LooseExpressions, Options::default());
        assert!(lexer.perform(|_| calls += 1).is_ok());
        assert_eq!(calls, 0);
    }
}

mod javascript {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex_js(source: &str) -> Result<usize, LexError> {
        let exprs = ScriptExpressions::new().unwrap();
        lex_with(source, exprs, &Options::default()).map(|root| root.line_depth())
    }

    #[test]
    fn accepts_valid_expressions() {
        let source = "ul\n  each item, i in items.filter(x => x.ok)\n    li(class={active: i === 0})= item.name\n";
        assert_eq!(lex_js(source).unwrap(), 3);
    }

    #[test]
    fn rejects_ranges() {
        let err = lex_js("- for i in 0..3\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidExpression(ExprContext::EachLoop));
    }

    #[test]
    fn mixin_shape_from_syntax_tree() {
        assert!(lex_js("mixin button(label)\n").is_ok());
        let err = lex_js("mixin ui.button(label)\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidMixinDefinition);
    }

    #[test]
    fn code_statements() {
        assert!(lex_js("- const total = items.length;\n").is_ok());
        let err = lex_js("- const = 1\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidExpression(ExprContext::Code));
    }
}
