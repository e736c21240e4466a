macro_rules! token_kinds {
    (
        fixed { $($fixed:ident,)* }
        punctuation { $($punct:ident => $punct_text:literal,)* }
        keywords { $($kw:ident => $kw_text:literal,)* }
    ) => {
        /// Fine-grained classification of a markup fragment.
        ///
        /// Punctuation and keyword fragments map onto a dedicated variant by
        /// their text; fragments with unknown text classify as `None`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MarkupTokenKind {
            $($fixed,)*
            $($punct,)*
            $($kw,)*
        }

        impl MarkupTokenKind {
            pub fn punctuation(text: &str) -> Option<Self> {
                match text {
                    $($punct_text => Some(MarkupTokenKind::$punct),)*
                    _ => None,
                }
            }

            pub fn keyword(text: &str) -> Option<Self> {
                match text {
                    $($kw_text => Some(MarkupTokenKind::$kw),)*
                    _ => None,
                }
            }

            /// Canonical text of punctuation and keyword tokens.
            pub fn text(self) -> Option<&'static str> {
                match self {
                    $(MarkupTokenKind::$punct => Some($punct_text),)*
                    $(MarkupTokenKind::$kw => Some($kw_text),)*
                    _ => None,
                }
            }

            pub fn is_punctuation(self) -> bool {
                matches!(self, $(MarkupTokenKind::$punct)|*)
            }

            pub fn is_keyword(self) -> bool {
                matches!(self, $(MarkupTokenKind::$kw)|*)
            }
        }
    };
}

token_kinds! {
    fixed {
        None,
        LineBreak,
        Space,
        LiteralString,
        LiteralNumber,
        ReferenceToken,
    }
    punctuation {
        AmpersandToken => "&",
        AsteriskToken => "*",
        BarToken => "|",
        CaretToken => "^",
        CloseBraceToken => "}",
        CloseBracketToken => "]",
        CloseParenToken => ")",
        ColonToken => ":",
        CommaToken => ",",
        DotToken => ".",
        EqualsEqualsToken => "==",
        EqualsToken => "=",
        ExclamationEqualsToken => "!=",
        ExclamationToken => "!",
        GreaterThanEqualsToken => ">=",
        GreaterThanGreaterThanGreaterThanToken => ">>>",
        GreaterThanGreaterThanToken => ">>",
        GreaterThanToken => ">",
        LessThanEqualsToken => "<=",
        LessThanLessThanToken => "<<",
        LessThanToken => "<",
        MinusMinusToken => "--",
        MinusToken => "-",
        OpenBraceToken => "{",
        OpenBracketToken => "[",
        OpenParenToken => "(",
        PercentToken => "%",
        PlusPlusToken => "++",
        PlusToken => "+",
        QuestionToken => "?",
        SemicolonToken => ";",
        SlashToken => "/",
        TildeToken => "~",
    }
    keywords {
        AbstractKeyword => "abstract",
        AddKeyword => "add",
        BoolKeyword => "bool",
        ByteKeyword => "byte",
        CdeclKeyword => "Cdecl",
        CharKeyword => "char",
        ClassKeyword => "class",
        ConstKeyword => "const",
        DecimalKeyword => "decimal",
        DefaultKeyword => "default",
        DelegateKeyword => "delegate",
        DoubleKeyword => "double",
        DynamicKeyword => "dynamic",
        EnumKeyword => "enum",
        EventKeyword => "event",
        ExplicitKeyword => "explicit",
        FalseKeyword => "false",
        FastcallKeyword => "Fastcall",
        FloatKeyword => "float",
        GetKeyword => "get",
        ImplicitKeyword => "implicit",
        InKeyword => "in",
        IntKeyword => "int",
        InterfaceKeyword => "interface",
        InternalKeyword => "internal",
        LongKeyword => "long",
        NamespaceKeyword => "namespace",
        NewKeyword => "new",
        NotnullKeyword => "notnull",
        NullKeyword => "null",
        ObjectKeyword => "object",
        OperatorKeyword => "operator",
        OutKeyword => "out",
        OverrideKeyword => "override",
        ParamsKeyword => "params",
        PrivateKeyword => "private",
        ProtectedKeyword => "protected",
        PublicKeyword => "public",
        ReadonlyKeyword => "readonly",
        RefKeyword => "ref",
        RemoveKeyword => "remove",
        ReturnKeyword => "return",
        SbyteKeyword => "sbyte",
        SealedKeyword => "sealed",
        SetKeyword => "set",
        ShortKeyword => "short",
        StaticKeyword => "static",
        StdcallKeyword => "Stdcall",
        StringKeyword => "string",
        StructKeyword => "struct",
        ThisKeyword => "this",
        ThiscallKeyword => "Thiscall",
        TrueKeyword => "true",
        TypeofKeyword => "typeof",
        UintKeyword => "uint",
        UlongKeyword => "ulong",
        UnmanagedKeyword => "unmanaged",
        UshortKeyword => "ushort",
        VirtualKeyword => "virtual",
        VoidKeyword => "void",
        VolatileKeyword => "volatile",
        WhereKeyword => "where",
    }
}
