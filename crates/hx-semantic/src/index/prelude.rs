//! Builtin declarations every project sees.
//!
//! The prelude is ordinary source text, indexed like any other file and
//! flagged as prelude so root-package lookups fall back to it.

/// Path, package-relative module name and text of each prelude file.
pub(crate) const PRELUDE_FILES: &[(&str, &str)] = &[
    ("<prelude>/StdTypes.hx", STD_TYPES),
    ("<prelude>/haxe/Log.hx", HAXE_LOG),
];

const STD_TYPES: &str = r#"
@:coreType abstract Void {}

@:coreType abstract Float {}

@:coreType abstract Int to Float {}

@:coreType abstract Bool {}

@:coreType abstract Dynamic<T> {}

@:coreType abstract Any {}

@:coreType abstract Null<T> from T to T {}

@:coreType abstract EnumValue {}

@:coreType abstract Class<T> {}

@:coreType abstract Enum<T> {}

extern class String {
    var length(default, null):Int;
    function new(string:String):Void;
    function toUpperCase():String;
    function toLowerCase():String;
    function charAt(index:Int):String;
    function charCodeAt(index:Int):Null<Int>;
    function indexOf(str:String, ?startIndex:Int):Int;
    function lastIndexOf(str:String, ?startIndex:Int):Int;
    function split(delimiter:String):Array<String>;
    function substr(pos:Int, ?len:Int):String;
    function substring(startIndex:Int, ?endIndex:Int):String;
    function toString():String;
    static function fromCharCode(code:Int):String;
}

extern class Array<T> {
    var length(default, null):Int;
    function new():Void;
    function concat(a:Array<T>):Array<T>;
    function join(sep:String):String;
    function pop():Null<T>;
    function push(x:T):Int;
    function reverse():Void;
    function shift():Null<T>;
    function slice(pos:Int, ?end:Int):Array<T>;
    function sort(f:(T, T) -> Int):Void;
    function splice(pos:Int, len:Int):Array<T>;
    function toString():String;
    function unshift(x:T):Void;
    function insert(pos:Int, x:T):Void;
    function remove(x:T):Bool;
    function contains(x:T):Bool;
    function indexOf(x:T, ?fromIndex:Int):Int;
    function lastIndexOf(x:T, ?fromIndex:Int):Int;
    function copy():Array<T>;
    function iterator():Iterator<T>;
    function keyValueIterator():KeyValueIterator<Int, T>;
    function map<S>(f:(item:T) -> S):Array<S>;
    function filter(f:(item:T) -> Bool):Array<T>;
    function resize(len:Int):Void;
}

extern class Map<K, V> {
    function new():Void;
    function set(key:K, value:V):Void;
    function get(key:K):Null<V>;
    function exists(key:K):Bool;
    function remove(key:K):Bool;
    function keys():Iterator<K>;
    function iterator():Iterator<V>;
    function keyValueIterator():KeyValueIterator<K, V>;
    function copy():Map<K, V>;
    function toString():String;
    function clear():Void;
}

extern class IntIterator {
    function new(min:Int, max:Int):Void;
    function hasNext():Bool;
    function next():Int;
}

typedef Iterator<T> = {
    function hasNext():Bool;
    function next():T;
}

typedef Iterable<T> = {
    function iterator():Iterator<T>;
}

typedef KeyValueIterator<K, V> = Iterator<{key:K, value:V}>;

extern class Std {
    static function string(s:Dynamic):String;
    static function int(x:Float):Int;
    static function parseInt(x:String):Null<Int>;
    static function parseFloat(x:String):Float;
    static function random(x:Int):Int;
    static function isOfType(v:Dynamic, t:Dynamic):Bool;
}

extern class Math {
    static var PI(default, null):Float;
    static var NaN(default, null):Float;
    static function abs(v:Float):Float;
    static function min(a:Float, b:Float):Float;
    static function max(a:Float, b:Float):Float;
    static function floor(v:Float):Int;
    static function ceil(v:Float):Int;
    static function round(v:Float):Int;
    static function sqrt(v:Float):Float;
    static function pow(v:Float, exp:Float):Float;
    static function random():Float;
}

extern class StringTools {
    static function trim(s:String):String;
    static function startsWith(s:String, start:String):Bool;
    static function endsWith(s:String, end:String):Bool;
    static function replace(s:String, sub:String, by:String):String;
    static function lpad(s:String, c:String, l:Int):String;
    static function rpad(s:String, c:String, l:Int):String;
    static function hex(n:Int, ?digits:Int):String;
}

extern class Lambda {
    static function array<A>(it:Iterable<A>):Array<A>;
    static function has<A>(it:Iterable<A>, elt:A):Bool;
    static function exists<A>(it:Iterable<A>, f:(item:A) -> Bool):Bool;
    static function count<A>(it:Iterable<A>, ?pred:(item:A) -> Bool):Int;
    static function fold<A, B>(it:Iterable<A>, f:(item:A, result:B) -> B, first:B):B;
}
"#;

const HAXE_LOG: &str = r#"
package haxe;

extern class Log {
    static function trace(v:Dynamic, ?infos:Dynamic):Void;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prelude_parses_cleanly() {
        for (path, text) in PRELUDE_FILES {
            let parse = hx_parser::parse(text);
            assert!(parse.ok(), "{path}: {:?}", parse.errors());
        }
    }
}
