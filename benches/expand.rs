use criterion::{Criterion, criterion_group, criterion_main};
use lush_prompt::color::ColorCapability;
use lush_prompt::context::PromptContext;
use lush_prompt::expand::expand;
use lush_prompt::template::TemplateContext;

fn render_ctx() -> PromptContext {
    let mut ctx = PromptContext::from_environment();
    ctx.color = ColorCapability::FULL;
    ctx.cwd_display = "~/src/lush".to_string();
    ctx
}

fn bench_plain_prompt(c: &mut Criterion) {
    let tpl = TemplateContext::new();
    let ctx = render_ctx();
    c.bench_function("expand_plain", |b| {
        b.iter(|| expand(r"\u@\h:\w\$ ", &tpl, &ctx).unwrap());
    });
}

fn bench_mixed_vocabulary_prompt(c: &mut Criterion) {
    let mut tpl = TemplateContext::new();
    tpl.set("git_branch", "main");
    tpl.set_condition("dirty", true);
    let ctx = render_ctx();
    let format = r"${?dirty:*:}\u@%m:${git_branch} %F{#00AFFF}\w%f \$ ";
    c.bench_function("expand_mixed_vocabulary", |b| {
        b.iter(|| expand(format, &tpl, &ctx).unwrap());
    });
}

criterion_group!(benches, bench_plain_prompt, bench_mixed_vocabulary_prompt);
criterion_main!(benches);
