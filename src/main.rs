use xsh::Interpreter;

fn main() {
    println!("Welcome to xsh - Your Custom Shell!");
    let mut shell = Interpreter::default();
    if let Err(err) = shell.repl() {
        eprintln!("xsh: {err}");
        std::process::exit(1);
    }
}
